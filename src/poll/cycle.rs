//! One fetch-and-notify cycle.
//!
//! A cycle threads the whole pipeline: current config and token, remote
//! gift fetch, deduplication and filtering, notification dispatch, and
//! seen-set persistence. Any error leaves persisted state untouched and
//! produces zero notifications; the scheduler retries on the next tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::auth::TokenAuthority;
use crate::config::ConfigSynchronizer;
use crate::error::CycleError;
use crate::gifts::{DedupFilterEngine, FeedError, FilterSettings, GiftFeed};
use crate::notify::NotificationDispatcher;
use crate::prefs::NotificationPrefs;

/// Summary of one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Rows returned by the feed.
    pub fetched: usize,
    /// Gifts that were new and passed the filters.
    pub fresh: usize,
    /// Notifications actually emitted.
    pub notified: usize,
}

/// Runs the fetch, dedup, filter, and notify pipeline.
pub struct SyncCycle {
    authority: Arc<TokenAuthority>,
    config: Arc<ConfigSynchronizer>,
    feed: GiftFeed,
    engine: Arc<DedupFilterEngine>,
    dispatcher: NotificationDispatcher,
    prefs: Arc<RwLock<NotificationPrefs>>,
    cycles_completed: AtomicU64,
}

impl SyncCycle {
    pub fn new(
        authority: Arc<TokenAuthority>,
        config: Arc<ConfigSynchronizer>,
        feed: GiftFeed,
        engine: Arc<DedupFilterEngine>,
        dispatcher: NotificationDispatcher,
        prefs: Arc<RwLock<NotificationPrefs>>,
    ) -> Self {
        Self {
            authority,
            config,
            feed,
            engine,
            dispatcher,
            prefs,
            cycles_completed: AtomicU64::new(0),
        }
    }

    /// Cycles completed since construction.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    /// The shared preferences handle.
    pub fn prefs(&self) -> Arc<RwLock<NotificationPrefs>> {
        Arc::clone(&self.prefs)
    }

    /// Run one cycle.
    pub async fn run(&self) -> Result<CycleReport, CycleError> {
        // Config refresh is best-effort: accessors fall back to the cached
        // document or the built-in defaults either way.
        if let Err(e) = self.config.refresh().await {
            tracing::warn!(code = e.error_code(), error = %e, "Config refresh failed this cycle");
        }

        let token = match self.authority.current_token() {
            Some(token) => token,
            None => self.authority.authenticate().await?,
        };

        let envelopes = match self.feed.recent(&token).await {
            Ok(envelopes) => envelopes,
            Err(FeedError::Unauthorized) => {
                // Single re-authentication, single retry
                let fresh = self.authority.authenticate().await?;
                match self.feed.recent(&fresh).await {
                    Ok(envelopes) => envelopes,
                    Err(e) => return Err(feed_error(e)),
                }
            }
            Err(e) => return Err(feed_error(e)),
        };

        let filter = self.filter_settings();
        let fetched = envelopes.len();
        let outcome = self.engine.process(envelopes, &filter).await;

        let prefs = self.prefs.read().unwrap().clone();
        let notified = self.dispatcher.dispatch_all(&outcome.fresh, &prefs).await;

        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        let report = CycleReport {
            fetched,
            fresh: outcome.fresh.len(),
            notified,
        };
        tracing::debug!(
            fetched = report.fetched,
            fresh = report.fresh,
            notified = report.notified,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Resolve this cycle's filter settings from the user preferences and
    /// the current config document. The minimum price is capped by the
    /// config's `max_price_filter`.
    fn filter_settings(&self) -> FilterSettings {
        let prefs = self.prefs.read().unwrap();
        FilterSettings {
            min_price: prefs.min_price.min(self.config.max_price_filter()),
            selected_channels: prefs.selected_channels.clone(),
        }
    }
}

fn feed_error(e: FeedError) -> CycleError {
    match e {
        FeedError::Fetch(http) => CycleError::Fetch(http),
        FeedError::InvalidResponse(message) => CycleError::InvalidResponse { message },
        FeedError::Unauthorized => CycleError::Fetch(crate::traits::HttpError::ServerError {
            status: 401,
            message: "token rejected after re-authentication".to_string(),
        }),
    }
}
