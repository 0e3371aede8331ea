//! Startup preflight.
//!
//! Warms the components from the vault and decides whether the app can
//! operate. Only one condition blocks startup: a first launch with no
//! cached configuration and no way to authenticate. Everything else
//! degrades to cached state or built-in defaults and self-heals on later
//! polling ticks.

use std::sync::Arc;

use crate::auth::TokenAuthority;
use crate::config::{ConfigSynchronizer, RefreshOutcome};
use crate::error::{ConfigError, StartupError};
use crate::gifts::DedupFilterEngine;

/// Result of the preflight checks.
#[derive(Debug, Default)]
pub struct PreflightReport {
    /// A fresh config document was fetched and verified.
    pub config_fresh: bool,
    /// The backend requires an app update before continuing.
    pub update_required: bool,
}

/// Load persisted state and attempt a first refresh.
///
/// # Errors
/// [`StartupError`] only on the first-launch condition: authentication
/// failed with no cached token AND no config cache exists.
pub async fn preflight(
    authority: &Arc<TokenAuthority>,
    config: &Arc<ConfigSynchronizer>,
    engine: &Arc<DedupFilterEngine>,
) -> Result<PreflightReport, StartupError> {
    authority.initialize().await;
    config.initialize().await;
    engine.initialize().await;

    let mut report = PreflightReport::default();

    match config.refresh().await {
        Ok(RefreshOutcome::Fresh) => {
            report.config_fresh = true;
        }
        Ok(RefreshOutcome::CacheRetained { reason }) => {
            tracing::info!(error = %reason, "Starting on cached configuration");
        }
        Err(ConfigError::Auth(auth)) => {
            // No cache and no token: the one user-visible blocking state
            return Err(StartupError {
                auth,
                config: ConfigError::NoConfigAvailable,
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "Starting without configuration, using defaults");
        }
    }

    report.update_required = config.is_update_required();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MemoryStore, MockHttpClient, MockResponse};
    use crate::auth::AppIdentity;
    use crate::config::sign_document;
    use crate::traits::{HttpError, Response};
    use crate::vault::SecretVault;
    use bytes::Bytes;
    use serde_json::json;

    const BASE: &str = "https://api.example.com";

    fn identity() -> AppIdentity {
        AppIdentity {
            app_version: "1.2.0".to_string(),
            shared_secret: "secret".to_string(),
            device_id: "device-1".to_string(),
        }
    }

    fn components(
        http: &MockHttpClient,
        store: &MemoryStore,
    ) -> (
        Arc<TokenAuthority>,
        Arc<ConfigSynchronizer>,
        Arc<DedupFilterEngine>,
    ) {
        let vault = Arc::new(SecretVault::new(Arc::new(store.clone())));
        let authority = Arc::new(TokenAuthority::new(
            Arc::new(http.clone()),
            Arc::clone(&vault),
            BASE,
            identity(),
        ));
        let config = Arc::new(ConfigSynchronizer::new(
            Arc::new(http.clone()),
            Arc::clone(&vault),
            Arc::clone(&authority),
            BASE,
        ));
        let engine = Arc::new(DedupFilterEngine::new(vault));
        (authority, config, engine)
    }

    fn signed_config() -> String {
        let mut raw = json!({
            "monitoring_channels": ["@a"],
            "features": {"background_monitoring": true},
            "security": {"min_app_version": "1.0.0", "force_update": false}
        });
        sign_document(&mut raw, "secret");
        raw.to_string()
    }

    #[tokio::test]
    async fn test_preflight_online_first_launch() {
        let http = MockHttpClient::new();
        http.set_response(
            &format!("{}/api/auth/app", BASE),
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"token":"jwt-1"}"#))),
        );
        http.set_response(
            &format!("{}/api/config", BASE),
            MockResponse::Success(Response::new(200, Bytes::from(signed_config()))),
        );

        let store = MemoryStore::new();
        let (authority, config, engine) = components(&http, &store);
        let report = preflight(&authority, &config, &engine).await.unwrap();
        assert!(report.config_fresh);
        assert!(!report.update_required);
    }

    #[tokio::test]
    async fn test_preflight_offline_first_launch_blocks() {
        let http = MockHttpClient::new();
        http.set_response(
            BASE,
            MockResponse::Error(HttpError::ConnectionFailed("no route".to_string())),
        );

        let store = MemoryStore::new();
        let (authority, config, engine) = components(&http, &store);
        let err = preflight(&authority, &config, &engine).await.unwrap_err();
        assert!(matches!(err.config, ConfigError::NoConfigAvailable));
    }

    #[tokio::test]
    async fn test_preflight_offline_with_cache_proceeds() {
        let http = MockHttpClient::new();
        http.set_response(
            &format!("{}/api/auth/app", BASE),
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"token":"jwt-1"}"#))),
        );
        http.set_response(
            &format!("{}/api/config", BASE),
            MockResponse::Success(Response::new(200, Bytes::from(signed_config()))),
        );

        // First run online to populate the cache
        let store = MemoryStore::new();
        {
            let (authority, config, engine) = components(&http, &store);
            preflight(&authority, &config, &engine).await.unwrap();
        }

        // Second run fully offline
        let offline = MockHttpClient::new();
        offline.set_response(
            BASE,
            MockResponse::Error(HttpError::ConnectionFailed("no route".to_string())),
        );
        let (authority, config, engine) = components(&offline, &store);
        let report = preflight(&authority, &config, &engine).await.unwrap();
        assert!(!report.config_fresh);
        assert_eq!(config.monitoring_channels(), vec!["@a".to_string()]);
    }
}
