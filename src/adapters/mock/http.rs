//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses or errors for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful response
    Success(Response),
    /// Return an error
    Error(HttpError),
    /// Return each response in turn, repeating the last one when exhausted
    Sequence(Vec<Response>),
    /// Return a response after a delay, for in-flight overlap tests
    Delayed(Response, std::time::Duration),
}

/// Mock HTTP client for testing.
///
/// This client can be configured to return specific responses for URLs,
/// allowing tests to verify HTTP interactions without network access.
///
/// # Example
///
/// ```ignore
/// use giftwatch::adapters::mock::{MockHttpClient, MockResponse};
/// use giftwatch::traits::{Headers, HttpClient, Response};
/// use bytes::Bytes;
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.example.com/data",
///     MockResponse::Success(Response::new(200, Bytes::from("Hello"))),
/// );
///
/// let response = client.get("https://api.example.com/data", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(client.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Sequence positions by URL pattern
    sequence_positions: Arc<Mutex<HashMap<String, usize>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL.
    ///
    /// The URL is matched exactly first, then by prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self.sequence_positions.lock().unwrap().remove(url);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Count recorded requests whose URL contains `fragment`.
    pub fn request_count_for(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Record a request.
    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    /// Resolve the response for a URL.
    async fn get_response(&self, url: &str) -> Result<Response, HttpError> {
        let matched = {
            let responses = self.responses.lock().unwrap();
            responses
                .get(url)
                .map(|r| (url.to_string(), r.clone()))
                .or_else(|| {
                    responses
                        .iter()
                        .find(|(pattern, _)| url.starts_with(pattern.as_str()))
                        .map(|(pattern, r)| (pattern.clone(), r.clone()))
                })
        };

        match matched {
            Some((_, MockResponse::Success(response))) => Ok(response),
            Some((_, MockResponse::Error(err))) => Err(err),
            Some((_, MockResponse::Delayed(response, delay))) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some((pattern, MockResponse::Sequence(responses))) => {
                let response = {
                    let mut positions = self.sequence_positions.lock().unwrap();
                    let pos = positions.entry(pattern).or_insert(0);
                    let response = responses.get(*pos).or_else(|| responses.last()).cloned();
                    *pos += 1;
                    response
                };
                response.ok_or_else(|| HttpError::Other("Empty mock sequence".to_string()))
            }
            None => Err(HttpError::Other(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers, None);
        self.get_response(url).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));
        self.get_response(url).await
    }
}
