//! Mock HTTP client for testing.
//!
//! Responses are configured per URL as a queue: each request pops the front
//! entry until one is left, which then answers every further request. That
//! makes "fail twice, then succeed" sequences one line to set up.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::NetworkError;
use crate::traits::{Headers, HttpClient, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
}

/// Configured outcome for one request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(Response),
    Error(NetworkError),
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        MockResponse::Success(Response::new(status, body.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue for `url` with a single sticky response.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.lock_responses()
            .insert(url.to_string(), VecDeque::from([response]));
    }

    /// Append a response to the queue for `url`.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        self.lock_responses()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests made to exactly `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.get_requests().iter().filter(|r| r.url == url).count()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<MockResponse>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, method: &str, url: &str) -> Result<Response, NetworkError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: method.to_string(),
                url: url.to_string(),
            });

        let mut responses = self.lock_responses();
        let next = responses.get_mut(url).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        match next {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Ok(Response::new(404, format!("no mock response for {}", url))),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, _headers: &Headers) -> Result<Response, NetworkError> {
        self.respond("GET", url)
    }

    async fn delete(&self, url: &str, _headers: &Headers) -> Result<Response, NetworkError> {
        self.respond("DELETE", url)
    }
}
