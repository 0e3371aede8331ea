//! Deduplication and filtering of fetched gift batches.
//!
//! The engine owns the persisted seen-gift set. The set grows
//! monotonically and is never pruned; identifiers are opaque and
//! low-cardinality per user lifetime, and membership checks stay O(1)
//! through a hash set even at tens of thousands of entries.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::vault::SecretVault;

use super::{parse_price, GiftEnvelope};

/// Vault key for the persisted seen-gift ids.
const SEEN_KEY: &str = "seen_gifts";

/// Filter settings for one polling cycle, resolved from user preferences
/// and the current config document.
#[derive(Debug, Clone, Default)]
pub struct FilterSettings {
    /// Minimum qualifying price; 0 disables the filter.
    pub min_price: u64,
    /// Channels the user wants notifications from; `None` means all.
    pub selected_channels: Option<Vec<String>>,
}

impl FilterSettings {
    fn channel_selected(&self, channel: Option<&str>) -> bool {
        let Some(selected) = &self.selected_channels else {
            return true;
        };
        let Some(channel) = channel else {
            // A row with no channel cannot be deselected
            return true;
        };
        let normalized = channel.trim_start_matches('@');
        selected
            .iter()
            .any(|s| s.trim_start_matches('@') == normalized)
    }

    fn price_qualifies(&self, price: Option<&str>) -> bool {
        if self.min_price == 0 {
            return true;
        }
        let value = price.map(parse_price).unwrap_or(0.0);
        value >= self.min_price as f64
    }
}

/// Outcome of one deduplication pass.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Gifts that qualify for a notification, in discovery order.
    pub fresh: Vec<GiftEnvelope>,
    /// Rows inspected this cycle.
    pub inspected: usize,
    /// Ids added to the seen set this cycle.
    pub newly_seen: usize,
}

/// Maintains the seen-gift set and applies the user's filters.
pub struct DedupFilterEngine {
    vault: Arc<SecretVault>,
    seen: RwLock<HashSet<String>>,
}

impl DedupFilterEngine {
    pub fn new(vault: Arc<SecretVault>) -> Self {
        Self {
            vault,
            seen: RwLock::new(HashSet::new()),
        }
    }

    /// Load the persisted seen set.
    pub async fn initialize(&self) {
        if let Some(json) = self.vault.get(SEEN_KEY).await {
            match serde_json::from_str::<Vec<String>>(&json) {
                Ok(ids) => {
                    let mut seen = self.seen.write().unwrap();
                    seen.extend(ids);
                    tracing::debug!(count = seen.len(), "Loaded seen-gift set");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Seen-gift set unreadable, starting empty");
                }
            }
        }
    }

    /// Whether `id` has already been surfaced to the user.
    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.read().unwrap().contains(id)
    }

    /// Number of ids in the seen set.
    pub fn seen_count(&self) -> usize {
        self.seen.read().unwrap().len()
    }

    /// Process one fetched batch.
    ///
    /// Every inspected id joins the seen set exactly once, including gifts
    /// from deselected channels, so a later re-selection cannot produce
    /// false "new" triggers. Only new gifts passing both filters are
    /// returned for notification, in discovery order. The persisted set is
    /// merged by union with whatever is on disk, never overwritten
    /// wholesale.
    pub async fn process(
        &self,
        batch: Vec<GiftEnvelope>,
        filter: &FilterSettings,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome {
            inspected: batch.len(),
            ..Default::default()
        };

        {
            let mut seen = self.seen.write().unwrap();
            for envelope in batch {
                let Some(id) = envelope.gift_id().map(str::to_string) else {
                    tracing::debug!("Skipping feed row without a gift id");
                    continue;
                };
                if !seen.insert(id) {
                    continue;
                }
                outcome.newly_seen += 1;

                if !filter.channel_selected(envelope.channel_username.as_deref()) {
                    tracing::debug!(
                        channel = envelope.channel_username.as_deref().unwrap_or(""),
                        "Gift in deselected channel marked seen without notification"
                    );
                    continue;
                }
                if !filter.price_qualifies(envelope.gift_data.price.as_deref()) {
                    continue;
                }
                outcome.fresh.push(envelope);
            }
        }

        if outcome.newly_seen > 0 {
            self.persist().await;
        }
        outcome
    }

    /// Persist the seen set, merged by union with the stored copy.
    async fn persist(&self) {
        let mut merged: HashSet<String> = self.seen.read().unwrap().clone();
        if let Some(json) = self.vault.get(SEEN_KEY).await {
            if let Ok(stored) = serde_json::from_str::<Vec<String>>(&json) {
                merged.extend(stored);
            }
        }

        let mut ids: Vec<String> = merged.iter().cloned().collect();
        ids.sort();
        match serde_json::to_string(&ids) {
            Ok(json) => self.vault.put(SEEN_KEY, &json).await,
            Err(e) => tracing::warn!(error = %e, "Failed to serialize seen-gift set"),
        }

        let mut seen = self.seen.write().unwrap();
        *seen = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MemoryStore;
    use crate::gifts::Gift;

    fn engine() -> DedupFilterEngine {
        DedupFilterEngine::new(Arc::new(SecretVault::new(Arc::new(MemoryStore::new()))))
    }

    fn gift(id: &str, price: &str) -> GiftEnvelope {
        GiftEnvelope {
            gift_id: Some(id.to_string()),
            gift_data: Gift {
                id: Some(id.to_string()),
                price: Some(price.to_string()),
                ..Default::default()
            },
            channel_username: Some("@News_Collections".to_string()),
            ..Default::default()
        }
    }

    fn no_filter() -> FilterSettings {
        FilterSettings::default()
    }

    #[tokio::test]
    async fn test_two_gift_scenario() {
        // seen-set {}, batch [g1:500, g2:50], min price 100 -> one
        // notification for g1, seen-set {g1, g2}
        let engine = engine();
        let filter = FilterSettings {
            min_price: 100,
            selected_channels: None,
        };

        let outcome = engine
            .process(vec![gift("g1", "500"), gift("g2", "50")], &filter)
            .await;

        assert_eq!(outcome.fresh.len(), 1);
        assert_eq!(outcome.fresh[0].gift_id(), Some("g1"));
        assert_eq!(outcome.newly_seen, 2);
        assert!(engine.is_seen("g1"));
        assert!(engine.is_seen("g2"));
    }

    #[tokio::test]
    async fn test_idempotence_across_cycles() {
        let engine = engine();
        let first = engine.process(vec![gift("g1", "500")], &no_filter()).await;
        let second = engine.process(vec![gift("g1", "500")], &no_filter()).await;

        assert_eq!(first.fresh.len(), 1);
        assert_eq!(second.fresh.len(), 0);
        assert_eq!(second.newly_seen, 0);
        assert_eq!(engine.seen_count(), 1);
    }

    #[tokio::test]
    async fn test_price_filter_boundaries() {
        let filter_1000 = FilterSettings {
            min_price: 1000,
            selected_channels: None,
        };
        let filter_1500 = FilterSettings {
            min_price: 1500,
            selected_channels: None,
        };

        let engine_a = engine();
        let outcome = engine_a
            .process(vec![gift("g1", "1,250")], &filter_1000)
            .await;
        assert_eq!(outcome.fresh.len(), 1);

        let engine_b = engine();
        let outcome = engine_b
            .process(vec![gift("g1", "1,250")], &filter_1500)
            .await;
        assert_eq!(outcome.fresh.len(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_price_never_qualifies_with_positive_minimum() {
        let filter = FilterSettings {
            min_price: 1,
            selected_channels: None,
        };
        let engine = engine();
        let outcome = engine.process(vec![gift("g1", "N/A")], &filter).await;
        assert_eq!(outcome.fresh.len(), 0);
        // Still marked seen
        assert!(engine.is_seen("g1"));
    }

    #[tokio::test]
    async fn test_zero_minimum_disables_price_filter() {
        let engine = engine();
        let outcome = engine.process(vec![gift("g1", "N/A")], &no_filter()).await;
        assert_eq!(outcome.fresh.len(), 1);
    }

    #[tokio::test]
    async fn test_deselected_channel_suppresses_notification_but_marks_seen() {
        let filter = FilterSettings {
            min_price: 0,
            selected_channels: Some(vec!["@GiftsTracker".to_string()]),
        };
        let engine = engine();
        let outcome = engine.process(vec![gift("g1", "500")], &filter).await;

        assert_eq!(outcome.fresh.len(), 0);
        assert!(engine.is_seen("g1"));

        // Re-selecting the channel later does not resurface the gift
        let outcome = engine.process(vec![gift("g1", "500")], &no_filter()).await;
        assert_eq!(outcome.fresh.len(), 0);
    }

    #[tokio::test]
    async fn test_channel_match_ignores_at_prefix() {
        let filter = FilterSettings {
            min_price: 0,
            selected_channels: Some(vec!["News_Collections".to_string()]),
        };
        let engine = engine();
        let outcome = engine.process(vec![gift("g1", "500")], &filter).await;
        assert_eq!(outcome.fresh.len(), 1);
    }

    #[tokio::test]
    async fn test_seen_set_persists_across_instances() {
        let store = MemoryStore::new();
        let vault = Arc::new(SecretVault::new(Arc::new(store.clone())));
        {
            let engine = DedupFilterEngine::new(Arc::clone(&vault));
            engine.process(vec![gift("g1", "500")], &no_filter()).await;
        }

        let engine = DedupFilterEngine::new(vault);
        engine.initialize().await;
        assert!(engine.is_seen("g1"));
    }

    #[tokio::test]
    async fn test_persisted_set_merges_by_union() {
        let store = MemoryStore::new();
        let vault = Arc::new(SecretVault::new(Arc::new(store.clone())));

        // A concurrent writer persisted its own view
        let engine_a = DedupFilterEngine::new(Arc::clone(&vault));
        engine_a.process(vec![gift("a1", "1")], &no_filter()).await;

        // This engine never saw a1 but must not clobber it
        let engine_b = DedupFilterEngine::new(Arc::clone(&vault));
        engine_b.process(vec![gift("b1", "1")], &no_filter()).await;

        let engine = DedupFilterEngine::new(vault);
        engine.initialize().await;
        assert!(engine.is_seen("a1"));
        assert!(engine.is_seen("b1"));
    }

    #[tokio::test]
    async fn test_membership_stays_fast_with_large_set() {
        let engine = engine();
        let batch: Vec<GiftEnvelope> = (0..10_000)
            .map(|i| gift(&format!("g{}", i), "100"))
            .collect();
        engine.process(batch, &no_filter()).await;
        assert_eq!(engine.seen_count(), 10_000);

        let start = std::time::Instant::now();
        for i in 0..10_000 {
            assert!(engine.is_seen(&format!("g{}", i)));
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(1));

        // A repeat batch stays fully deduplicated
        let batch: Vec<GiftEnvelope> = (0..10_000)
            .map(|i| gift(&format!("g{}", i), "100"))
            .collect();
        let outcome = engine.process(batch, &no_filter()).await;
        assert_eq!(outcome.fresh.len(), 0);
        assert_eq!(outcome.newly_seen, 0);
    }

    #[tokio::test]
    async fn test_row_without_id_is_skipped() {
        let engine = engine();
        let envelope = GiftEnvelope {
            channel_username: Some("@x".to_string()),
            ..Default::default()
        };
        let outcome = engine.process(vec![envelope], &no_filter()).await;
        assert_eq!(outcome.fresh.len(), 0);
        assert_eq!(outcome.newly_seen, 0);
        assert_eq!(engine.seen_count(), 0);
    }
}
