//! Scripted `HttpBackend` for tests.
//!
//! # Why a mock backend?
//!
//! `ApiClient`'s interesting behaviour (status handling, error messages,
//! session invalidation) depends only on the status and body that come back.
//! `MockHttpBackend` returns responses from a queue filled by the test and
//! records every request it was asked to send, so assertions can check the
//! URL, the bearer token, and the body.
//!
//! # Usage in tests
//!
//! ```ignore
//! let backend = Arc::new(MockHttpBackend::new());
//! backend.push_json(401, json!({"msg": "Token has expired"}));
//! let client = ApiClient::new("http://test/api", backend.clone(), store);
//!
//! let err = client.get::<Value>("/auth/me").await.unwrap_err();
//! assert_eq!(backend.recorded().len(), 1);
//! ```
//!
//! When the queue is empty, `send` fails with `ApiError::Network`.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::application::api::{ApiError, ApiRequest, HttpBackend, RawResponse};

#[derive(Default)]
pub struct MockHttpBackend {
    responses: Mutex<VecDeque<Result<RawResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockHttpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response whose body is `body` serialized as JSON.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push(Ok(RawResponse {
            status,
            body: body.to_string().into_bytes(),
        }));
    }

    /// Queues a response with a literal body.
    pub fn push_raw(&self, status: u16, body: &str) {
        self.push(Ok(RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: ApiError) {
        self.push(Err(error));
    }

    /// Every request sent so far, oldest first.
    pub fn recorded(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Responses still queued.
    pub fn pending(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, response: Result<RawResponse, ApiError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }
}

#[async_trait]
impl HttpBackend for MockHttpBackend {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network(format!("no scripted response for {url}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::api::{HttpMethod, RequestBody};

    fn get(url: &str) -> ApiRequest {
        ApiRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            bearer_token: None,
            body: RequestBody::Empty,
        }
    }

    #[tokio::test]
    async fn test_responses_are_returned_in_order() {
        let backend = MockHttpBackend::new();
        backend.push_raw(200, "first");
        backend.push_raw(404, "second");

        let a = backend.send(get("http://x/a")).await.unwrap();
        let b = backend.send(get("http://x/b")).await.unwrap();

        assert_eq!(a.body, b"first");
        assert_eq!(b.status, 404);
        assert_eq!(backend.pending(), 0);
        assert_eq!(backend.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_queue_is_network_error() {
        let backend = MockHttpBackend::new();
        let result = backend.send(get("http://x/none")).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(backend.recorded()[0].url, "http://x/none");
    }
}
