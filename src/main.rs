//! Giftwatch entry point.
//!
//! Wires the explicitly constructed components together and runs the
//! polling scheduler in the foreground until interrupted.

use std::sync::{Arc, RwLock};

use tracing_subscriber::EnvFilter;

use giftwatch::adapters::{FileStore, OsNotifier, ReqwestHttpClient};
use giftwatch::auth::{AppIdentity, TokenAuthority};
use giftwatch::config::ConfigSynchronizer;
use giftwatch::gifts::{DedupFilterEngine, GiftFeed};
use giftwatch::notify::NotificationDispatcher;
use giftwatch::poll::{PollingScheduler, SyncCycle};
use giftwatch::prefs::NotificationPrefs;
use giftwatch::startup::preflight;
use giftwatch::vault::SecretVault;

/// Default backend base URL, overridable via GIFTWATCH_API_URL.
const DEFAULT_API_URL: &str = "https://api.giftwatch.app";

/// Shared signing secret configured at build time, overridable via
/// GIFTWATCH_APP_SECRET.
const APP_SECRET: &str = "your-secret-key-change-this";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("giftwatch=info")),
        )
        .init();

    let base_url =
        std::env::var("GIFTWATCH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let shared_secret =
        std::env::var("GIFTWATCH_APP_SECRET").unwrap_or_else(|_| APP_SECRET.to_string());

    let store = FileStore::new().ok_or("Could not determine the home directory")?;
    let vault = Arc::new(SecretVault::new(Arc::new(store)));
    let http: Arc<dyn giftwatch::traits::HttpClient> = Arc::new(ReqwestHttpClient::new());

    let identity = AppIdentity {
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        shared_secret,
        device_id: AppIdentity::load_or_assign_device_id(&vault).await,
    };

    let authority = Arc::new(TokenAuthority::new(
        Arc::clone(&http),
        Arc::clone(&vault),
        base_url.clone(),
        identity,
    ));
    let config = Arc::new(ConfigSynchronizer::new(
        Arc::clone(&http),
        Arc::clone(&vault),
        Arc::clone(&authority),
        base_url.clone(),
    ));
    let engine = Arc::new(DedupFilterEngine::new(Arc::clone(&vault)));

    let report = match preflight(&authority, &config, &engine).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Giftwatch cannot start: {}", e);
            eprintln!("Connect to the network once so the app can fetch its configuration.");
            std::process::exit(1);
        }
    };

    if report.update_required {
        tracing::warn!(
            min_version = %config.min_app_version(),
            "The backend requires a newer app version; polling may be rejected"
        );
    }

    let prefs = Arc::new(RwLock::new(NotificationPrefs::load(&vault).await));
    let feed = GiftFeed::new(Arc::clone(&http), base_url.clone());
    let dispatcher = NotificationDispatcher::new(Arc::new(OsNotifier::new()));

    let cycle = Arc::new(SyncCycle::new(
        authority,
        Arc::clone(&config),
        feed,
        engine,
        dispatcher,
        prefs,
    ));

    let scheduler = PollingScheduler::new(
        cycle,
        config.poll_interval(),
        config.is_background_monitoring_enabled(),
    );
    scheduler.start();
    tracing::info!(
        channels = config.monitoring_channels().len(),
        period_secs = config.poll_interval().as_secs(),
        "Giftwatch polling started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    scheduler.stop();
    Ok(())
}
