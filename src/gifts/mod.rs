//! Gift records and the recent-gifts feed.
//!
//! Gifts are immutable once received and never persisted beyond the
//! seen-set membership check. The upstream feed returns rows in no
//! guaranteed order.

mod dedup;
mod price;

pub use dedup::{CycleOutcome, DedupFilterEngine, FilterSettings};
pub use price::parse_price;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::traits::{Headers, HttpClient, HttpError};

/// Recent-gifts endpoint path.
const GIFTS_ENDPOINT: &str = "/api/v1/gifts/recent";

/// A gift detected upstream in a monitored channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Gift {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Display price as extracted from the channel message; may carry
    /// thousands separators.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub available: Option<u64>,
    #[serde(default)]
    pub available_percent: Option<f64>,
    #[serde(default)]
    pub is_limited: bool,
    #[serde(default)]
    pub is_sold_out: bool,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency_score: f64,
    #[serde(default)]
    pub detected_at: Option<chrono::NaiveDateTime>,
}

/// A row from the recent-gifts feed wrapping the gift with its source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GiftEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub gift_id: Option<String>,
    #[serde(default)]
    pub gift_data: Gift,
    #[serde(default)]
    pub channel_username: Option<String>,
    #[serde(default)]
    pub message_link: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl GiftEnvelope {
    /// The gift's identifier, preferring the dedicated feed column over the
    /// embedded gift payload.
    pub fn gift_id(&self) -> Option<&str> {
        self.gift_id
            .as_deref()
            .or(self.gift_data.id.as_deref())
            .or(self.id.as_deref())
    }
}

/// Errors fetching the recent-gifts feed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    /// The app token was rejected.
    #[error("Gift feed rejected the app token")]
    Unauthorized,
    /// Transport or HTTP failure.
    #[error("Gift feed fetch failed: {0}")]
    Fetch(HttpError),
    /// The feed response could not be parsed.
    #[error("Invalid gift feed response: {0}")]
    InvalidResponse(String),
}

/// Client for the recent-gifts feed.
pub struct GiftFeed {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl GiftFeed {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch the most recent gift rows.
    pub async fn recent(&self, token: &str) -> Result<Vec<GiftEnvelope>, FeedError> {
        let url = format!("{}{}", self.base_url, GIFTS_ENDPOINT);
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));

        let response = self
            .http
            .get(&url, &headers)
            .await
            .map_err(FeedError::Fetch)?;

        if response.status == 401 {
            return Err(FeedError::Unauthorized);
        }
        if !response.is_success() {
            return Err(FeedError::Fetch(HttpError::ServerError {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }));
        }

        response
            .json()
            .map_err(|e| FeedError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;

    const BASE: &str = "https://api.example.com";

    fn feed_row_json() -> &'static str {
        r#"[{
            "id": "5902339509239940491",
            "gift_id": "5902339509239940491",
            "gift_data": {
                "id": "5902339509239940491",
                "name": "Gift from Database",
                "price": "5,000",
                "total": 10000,
                "available": 250,
                "available_percent": 2.5,
                "is_limited": true,
                "is_sold_out": false,
                "emoji": "🎁",
                "urgency_score": 0.8
            },
            "channel_username": "@News_Collections",
            "message_link": "https://t.me/News_Collections/306",
            "created_at": "2026-08-08T10:00:00"
        }]"#
    }

    #[tokio::test]
    async fn test_recent_parses_feed_rows() {
        let http = MockHttpClient::new();
        http.set_response(
            &format!("{}{}", BASE, GIFTS_ENDPOINT),
            MockResponse::Success(Response::new(200, Bytes::from(feed_row_json()))),
        );

        let feed = GiftFeed::new(Arc::new(http.clone()), BASE);
        let rows = feed.recent("jwt-1").await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.gift_id(), Some("5902339509239940491"));
        assert_eq!(row.gift_data.price.as_deref(), Some("5,000"));
        assert!(row.gift_data.is_limited);
        assert_eq!(row.channel_username.as_deref(), Some("@News_Collections"));

        let request = &http.get_requests()[0];
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer jwt-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_recent_401_is_unauthorized() {
        let http = MockHttpClient::new();
        http.set_response(
            BASE,
            MockResponse::Success(Response::new(401, Bytes::from("{}"))),
        );

        let feed = GiftFeed::new(Arc::new(http), BASE);
        assert!(matches!(
            feed.recent("stale").await,
            Err(FeedError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_recent_transport_error() {
        let http = MockHttpClient::new();
        http.set_response(
            BASE,
            MockResponse::Error(HttpError::Timeout("10s".to_string())),
        );

        let feed = GiftFeed::new(Arc::new(http), BASE);
        assert!(matches!(feed.recent("t").await, Err(FeedError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_recent_invalid_body() {
        let http = MockHttpClient::new();
        http.set_response(
            BASE,
            MockResponse::Success(Response::new(200, Bytes::from("not json"))),
        );

        let feed = GiftFeed::new(Arc::new(http), BASE);
        assert!(matches!(
            feed.recent("t").await,
            Err(FeedError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_gift_id_fallback_order() {
        let mut envelope = GiftEnvelope::default();
        assert_eq!(envelope.gift_id(), None);

        envelope.id = Some("row-id".to_string());
        assert_eq!(envelope.gift_id(), Some("row-id"));

        envelope.gift_data.id = Some("data-id".to_string());
        assert_eq!(envelope.gift_id(), Some("data-id"));

        envelope.gift_id = Some("feed-id".to_string());
        assert_eq!(envelope.gift_id(), Some("feed-id"));
    }

    #[test]
    fn test_gift_deserializes_with_missing_fields() {
        let gift: Gift = serde_json::from_str(r#"{"id": "g1"}"#).unwrap();
        assert_eq!(gift.id.as_deref(), Some("g1"));
        assert!(!gift.is_limited);
        assert!(!gift.is_sold_out);
        assert_eq!(gift.urgency_score, 0.0);
        assert_eq!(gift.price, None);
    }
}
