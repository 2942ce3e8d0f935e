//! Integration tests for the session lifecycle.
//!
//! These tests drive `SessionManager` + `ApiClient` end-to-end over the
//! recording `MockHttpBackend` and a real `MemorySessionStore`, so every
//! assertion is on what actually got persisted.

use std::sync::Arc;

use hospital_client::application::api::{ApiClient, ApiError, HttpMethod};
use hospital_client::application::session::{SessionManager, SessionStore};
use hospital_client::infrastructure::storage::{
    FileSessionStore, MemorySessionStore, TOKEN_KEY, USER_KEY,
};
use hospital_client::infrastructure::transport::mock::MockHttpBackend;
use hospital_core::{Role, User};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

struct Harness {
    backend: Arc<MockHttpBackend>,
    store: Arc<MemorySessionStore>,
    session: SessionManager,
}

fn harness() -> Harness {
    let backend = Arc::new(MockHttpBackend::new());
    let store = Arc::new(MemorySessionStore::new());
    let api = ApiClient::new("http://hms.test/api/", backend.clone(), store.clone());
    let session = SessionManager::new(Arc::new(api));
    Harness {
        backend,
        store,
        session,
    }
}

fn signed_in_doctor(store: &MemorySessionStore) {
    let user = User {
        id: "65f0".to_string(),
        name: Some("Dr. Ada".to_string()),
        role: Role::Doctor,
        hospital_id: Some("HOSP001".to_string()),
        staff_id: Some("DOC-1".to_string()),
        ..User::default()
    };
    store.save("jwt-old", &user).unwrap();
}

// ── Login ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_then_me_uses_the_new_token() {
    // Arrange
    let mut h = harness();
    h.backend.push_json(
        200,
        json!({
            "access_token": "jwt-1",
            "user": { "id": "65f0", "name": "Dr. Ada", "role": "doctor" }
        }),
    );
    h.backend.push_json(
        200,
        json!({ "id": "65f0", "name": "Dr. Ada Lovelace", "role": "doctor" }),
    );

    // Act
    let outcome = assert_ok!(h.session.login("HOSP001", "DOC-1", "secret1").await);
    let refreshed = assert_ok!(h.session.refresh_user().await);

    // Assert
    assert!(!outcome.needs_password_reset);
    assert_eq!(h.store.raw(TOKEN_KEY).as_deref(), Some("jwt-1"));

    let refreshed = refreshed.expect("a token is stored, so /auth/me is called");
    assert_eq!(refreshed.name.as_deref(), Some("Dr. Ada Lovelace"));
    assert_eq!(refreshed.hospital_id.as_deref(), Some("HOSP001"));

    let requests = h.backend.recorded();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, "http://hms.test/api/auth/login");
    assert!(requests[0].bearer_token.is_none());
    assert_eq!(requests[1].url, "http://hms.test/api/auth/me");
    assert_eq!(requests[1].bearer_token.as_deref(), Some("jwt-1"));
}

#[tokio::test]
async fn test_failed_login_leaves_previous_session_untouched() {
    // Arrange
    let mut h = harness();
    signed_in_doctor(&h.store);
    h.backend
        .push_json(401, json!({ "error": "Invalid credentials" }));

    // Act
    let err = assert_err!(h.session.login("HOSP001", "DOC-1", "wrong").await);

    // Assert
    assert_eq!(
        err,
        ApiError::Http {
            status: 401,
            message: "Invalid credentials".to_string()
        }
    );
    assert_eq!(h.session.last_error(), Some("Invalid credentials"));
    assert_eq!(h.store.raw(TOKEN_KEY).as_deref(), Some("jwt-old"));
    assert!(h.store.raw(USER_KEY).is_some());
}

#[tokio::test]
async fn test_login_rejection_mentioning_token_does_not_clear_session() {
    // /auth/login is public: a 401 there is a bad password, never an
    // expired session, even if the message happens to say "token".
    let mut h = harness();
    signed_in_doctor(&h.store);
    h.backend
        .push_json(401, json!({ "msg": "token invalid for this hospital" }));

    let err = assert_err!(h.session.login("HOSP002", "DOC-1", "secret1").await);

    assert_ne!(err, ApiError::SessionExpired);
    assert_eq!(h.store.raw(TOKEN_KEY).as_deref(), Some("jwt-old"));
}

#[tokio::test]
async fn test_validation_details_surface_first_field_message() {
    let mut h = harness();
    h.backend.push_json(
        400,
        json!({
            "error": "Validation failed",
            "details": { "password": ["Too short"], "email": ["Not an email"] }
        }),
    );

    let err = assert_err!(h.session.login("HOSP001", "DOC-1", "x").await);

    match err {
        ApiError::Validation {
            status, details, ..
        } => {
            assert_eq!(status, Some(400));
            assert_eq!(details.len(), 2);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(h.session.last_error(), Some("Not an email"));
}

// ── Expiry ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_token_clears_session_everywhere() {
    // Arrange
    let mut h = harness();
    signed_in_doctor(&h.store);
    assert!(h.session.is_authenticated());
    h.backend
        .push_json(401, json!({ "msg": "Token has expired" }));

    // Act
    let err = assert_err!(h.session.refresh_user().await);

    // Assert
    assert_eq!(err, ApiError::SessionExpired);
    assert_eq!(
        h.session.last_error(),
        Some("Session expired. Please log in again.")
    );
    assert!(!h.session.is_authenticated());
    assert!(h.store.raw(TOKEN_KEY).is_none());
    assert!(h.store.raw(USER_KEY).is_none());
}

#[tokio::test]
async fn test_signature_failure_on_data_endpoint_clears_token() {
    // Arrange
    let h = harness();
    signed_in_doctor(&h.store);
    h.backend
        .push_json(422, json!({ "msg": "Signature verification failed" }));
    let api = ApiClient::new("http://hms.test/api", h.backend.clone(), h.store.clone());

    // Act
    let result = api.get::<serde_json::Value>("/doctor").await;

    // Assert
    assert_eq!(result, Err(ApiError::SessionExpired));
    assert!(assert_ok!(h.store.token()).is_none());
}

#[tokio::test]
async fn test_plain_server_error_keeps_session() {
    let h = harness();
    signed_in_doctor(&h.store);
    h.backend.push_raw(500, "");
    let api = ApiClient::new("http://hms.test/api", h.backend.clone(), h.store.clone());

    let result = api.get::<serde_json::Value>("/nurse").await;

    assert_eq!(
        result,
        Err(ApiError::Http {
            status: 500,
            message: "Request failed with status 500".to_string()
        })
    );
    assert_eq!(h.store.raw(TOKEN_KEY).as_deref(), Some("jwt-old"));
}

// ── Logout ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_logout_clears_store_when_server_is_unreachable() {
    // Arrange
    let mut h = harness();
    signed_in_doctor(&h.store);
    h.backend
        .push_error(ApiError::Network("connection refused".to_string()));

    // Act
    h.session.logout().await;

    // Assert
    assert!(!h.session.is_authenticated());
    assert!(!h.session.is_loading());
    assert!(h.store.raw(TOKEN_KEY).is_none());
    assert_eq!(h.backend.recorded()[0].url, "http://hms.test/api/auth/logout");
    assert_eq!(h.backend.pending(), 0);
}

#[tokio::test]
async fn test_refresh_after_logout_makes_no_request() {
    let mut h = harness();
    signed_in_doctor(&h.store);
    h.backend.push_json(200, json!({ "message": "Logged out" }));
    h.session.logout().await;

    let user = assert_ok!(h.session.refresh_user().await);

    assert!(user.is_none());
    assert_eq!(h.backend.recorded().len(), 1);
}

#[tokio::test]
async fn test_corrupt_session_file_recovers_through_logout_and_login() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("hospital_ops_flow_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("session.json");
    std::fs::write(&path, "{not json").unwrap();
    let backend = Arc::new(MockHttpBackend::new());
    let store = Arc::new(FileSessionStore::new(&path));
    let api = ApiClient::new("http://hms.test/api", backend.clone(), store.clone());
    let mut session = SessionManager::new(Arc::new(api));
    backend.push_json(200, json!({ "message": "Logged out" }));
    backend.push_json(
        200,
        json!({ "access_token": "jwt-2", "user": { "id": "65f0", "role": "nurse" } }),
    );

    // Act
    session.logout().await;
    let after_logout = assert_ok!(store.token());
    assert_ok!(session.login("HOSP001", "NUR-1", "secret1").await);

    // Assert
    assert!(after_logout.is_none());
    assert_eq!(assert_ok!(store.token()).as_deref(), Some("jwt-2"));
    let reopened = FileSessionStore::new(&path);
    assert_eq!(assert_ok!(reopened.user()).map(|u| u.role), Some(Role::Nurse));

    std::fs::remove_dir_all(&dir).ok();
}
