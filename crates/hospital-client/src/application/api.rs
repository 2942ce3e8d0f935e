//! ApiClient: the single entry point for every REST call.
//!
//! Every request goes through [`ApiClient::request`], which
//!
//! 1. joins the endpoint onto the configured base URL,
//! 2. attaches `Authorization: Bearer <token>` when a token is stored,
//! 3. picks JSON or multipart encoding from the [`RequestBody`] variant,
//! 4. hands the request to the injected [`HttpBackend`],
//! 5. turns a non-success response into an [`ApiError`] carrying the most
//!    specific message the server sent.
//!
//! # Session invalidation (for beginners)
//!
//! The backend issues JWT access tokens.  When one expires (or its signature
//! no longer verifies) protected endpoints answer `401` or `422` with a
//! message such as `"Token has expired"`.  The client cannot refresh tokens,
//! so the only useful reaction is to forget the stored session and make the
//! user sign in again.  That happens here, once, for every caller: the
//! stored token and user are cleared and [`ApiError::SessionExpired`] is
//! returned.
//!
//! The login-type endpoints are excluded.  A `401` from `/auth/login` means
//! "wrong password", not "your session died", and must not sign out a user
//! who is still signed in elsewhere in the app.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::session::SessionStore;

/// Endpoints that never carry a session worth invalidating.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/patient-login",
    "/auth/signup",
    "/auth/hospitals",
];

/// Statuses the backend uses for rejected tokens.
const TOKEN_REJECTED_STATUSES: &[u16] = &[401, 422];

/// Fragments that identify a token problem in an error message.
const TOKEN_REJECTED_MARKERS: &[&str] = &["expired", "signature", "token"];

/// Message shown when the session has been invalidated.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error type for REST calls.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The stored token was rejected; the local session has been cleared.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// Input was rejected, either by the server (`details` envelope, with a
    /// status) or before sending (no status).
    #[error("{message}")]
    Validation {
        status: Option<u16>,
        message: String,
        details: BTreeMap<String, Vec<String>>,
    },

    /// A success body could not be decoded into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be built.
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl ApiError {
    /// Client-side validation failure with no field details.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: None,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Validation { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Request payload.  The variant decides the wire encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<(String, FormPart)>),
}

impl RequestBody {
    /// Serializes `payload` into a JSON body.
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> Result<Self, ApiError> {
        serde_json::to_value(payload)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Encode(e.to_string()))
    }
}

/// A fully resolved request as handed to the [`HttpBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: RequestBody,
}

/// Status and raw body bytes of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Port for the HTTP exchange itself.
///
/// Production uses `ReqwestBackend`; tests use the scripted
/// `MockHttpBackend`.  Implementations only move bytes: status handling and
/// error-body parsing belong to [`ApiClient`].
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct ApiClient {
    base_url: String,
    backend: Arc<dyn HttpBackend>,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        backend: Arc<dyn HttpBackend>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            backend,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session store whose token this client attaches.
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(HttpMethod::Get, endpoint, RequestBody::Empty)
            .await
    }

    pub async fn post<T, B>(&self, endpoint: &str, payload: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = RequestBody::json(payload)?;
        self.request(HttpMethod::Post, endpoint, body).await
    }

    /// Sends one request and decodes the success body into `T`.
    ///
    /// An empty success body decodes as JSON `null`, so `T = ()` or
    /// `T = Option<_>` work for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] when no response arrived.
    /// - [`ApiError::SessionExpired`] when the stored token was rejected; the
    ///   stored session has been cleared.
    /// - [`ApiError::Validation`] / [`ApiError::Http`] for other failures.
    /// - [`ApiError::Decode`] when a success body does not fit `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let token = match self.store.token() {
            Ok(token) => token,
            Err(e) => {
                warn!(endpoint, "could not read stored token, sending unauthenticated: {e}");
                None
            }
        };
        let has_token = token.is_some();

        let request = ApiRequest {
            method,
            url: self.url_for(endpoint),
            bearer_token: token,
            body,
        };
        debug!(?method, url = %request.url, authenticated = has_token, "sending request");

        let response = match self.backend.send(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(endpoint, "request failed: {e}");
                return Err(e);
            }
        };

        if !response.is_success() {
            let err = self.failure(endpoint, has_token, &response);
            error!(endpoint, status = response.status, "request failed: {err}");
            return Err(err);
        }

        decode_body(&response.body).map_err(|e| {
            error!(endpoint, status = response.status, "{e}");
            e
        })
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Builds the error for a non-success response, clearing the stored
    /// session when the token was rejected.
    fn failure(&self, endpoint: &str, has_token: bool, response: &RawResponse) -> ApiError {
        let body = parse_error_body(&response.body);

        if has_token && is_token_rejection(endpoint, response.status, &body) {
            if let Err(e) = self.store.clear() {
                warn!(endpoint, "failed to clear rejected session: {e}");
            }
            return ApiError::SessionExpired;
        }

        let details = parse_details(&body);
        let message = error_message(response.status, &body, &details);
        if details.is_empty() {
            ApiError::Http {
                status: response.status,
                message,
            }
        } else {
            ApiError::Validation {
                status: Some(response.status),
                message,
                details,
            }
        }
    }
}

// ── Body helpers ──────────────────────────────────────────────────────────────

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let is_blank = bytes.iter().all(u8::is_ascii_whitespace);
    let result = if is_blank {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };
    result.map_err(|e| ApiError::Decode(e.to_string()))
}

/// Parses an error body; anything that is not JSON counts as `null`.
fn parse_error_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

/// Reads `details` as `{field: [messages]}`; a bare string per field is
/// accepted as a single message.
fn parse_details(body: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(fields) = body.get("details").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    fields
        .iter()
        .filter_map(|(field, messages)| {
            let messages: Vec<String> = match messages {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect()
}

fn text_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Most specific message available: first field message in `details`, then
/// `error`, then `msg`, then a generic status line.
fn error_message(status: u16, body: &Value, details: &BTreeMap<String, Vec<String>>) -> String {
    details
        .values()
        .find_map(|messages| messages.first().cloned())
        .or_else(|| text_field(body, "error").map(str::to_string))
        .or_else(|| text_field(body, "msg").map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

fn is_public(endpoint: &str) -> bool {
    let path = endpoint.split('?').next().unwrap_or(endpoint);
    let path = path.trim_matches('/');
    PUBLIC_ENDPOINTS
        .iter()
        .any(|public| public.trim_start_matches('/') == path)
}

fn is_token_rejection(endpoint: &str, status: u16, body: &Value) -> bool {
    if is_public(endpoint) || !TOKEN_REJECTED_STATUSES.contains(&status) {
        return false;
    }
    ["error", "msg", "message"]
        .iter()
        .filter_map(|key| text_field(body, key))
        .map(str::to_lowercase)
        .any(|text| TOKEN_REJECTED_MARKERS.iter().any(|m| text.contains(m)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
