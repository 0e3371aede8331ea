//! Authenticated encryption for vault values.
//!
//! AES-256-GCM with a random 96-bit nonce prepended to the ciphertext,
//! hex-encoded for storage. Decryption failure means tamper, corruption,
//! or a wrong key; callers treat it as data-absent.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};

/// AES-GCM standard nonce size.
const NONCE_SIZE: usize = 12;

/// Encrypt `plaintext` under `key`, returning hex(nonce || ciphertext).
pub fn seal(key: &[u8; 32], plaintext: &str) -> Option<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher.encrypt(&nonce, plaintext.as_bytes()).ok()?;

    let mut out = nonce.to_vec();
    out.extend_from_slice(&ciphertext);
    Some(hex::encode(out))
}

/// Decrypt hex(nonce || ciphertext) under `key`.
///
/// Returns `None` on any decode or authentication failure.
pub fn open(key: &[u8; 32], stored: &str) -> Option<String> {
    let data = hex::decode(stored).ok()?;
    if data.len() < NONCE_SIZE {
        return None;
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .ok()?;

    String::from_utf8(plaintext).ok()
}
