//! SessionManager: who is signed in, and how they got there.
//!
//! # Session lifecycle (for beginners)
//!
//! ```text
//!                login / patient_login / signup
//!   SignedOut ──────────────────────────────────► SignedIn(user)
//!       ▲                                             │
//!       │   logout, refresh failure, token rejected   │
//!       └─────────────────────────────────────────────┘
//! ```
//!
//! The access token and the user record are persisted through the
//! [`SessionStore`] port under two keys (`token`, `user`) that are always
//! written and cleared together.  A new `SessionManager` restores the user
//! from the store, so a restart behaves like a page reload: still signed in,
//! pending a [`SessionManager::refresh_user`] to confirm the token.
//!
//! Every operation resets the last error and raises the in-flight flag on
//! entry, and lowers the flag on exit.  A failed operation records the
//! error's message and leaves the previous session untouched; the one
//! exception is [`ApiError::SessionExpired`], after which the transport has
//! already cleared the store and the user is dropped here too.

use std::sync::Arc;

use hospital_core::{Hospital, Role, User};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::api::{ApiClient, ApiError};

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LEN: usize = 6;

// ── Storage port ──────────────────────────────────────────────────────────────

/// Error type for session persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error accessing session file at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored session is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence for the access token and the signed-in user.
///
/// Implementations live in the infrastructure layer (`FileSessionStore`,
/// `MemorySessionStore`).
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Result<Option<String>, StorageError>;

    fn user(&self) -> Result<Option<User>, StorageError>;

    /// Stores the token and user together.
    fn save(&self, token: &str, user: &User) -> Result<(), StorageError>;

    /// Replaces the stored user, keeping the token.
    fn save_user(&self, user: &User) -> Result<(), StorageError>;

    /// Removes both keys.
    fn clear(&self) -> Result<(), StorageError>;
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Result of a staff login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: User,
    /// First login on an account created without a password: the caller
    /// should route the user to [`SessionManager::change_password`].
    pub needs_password_reset: bool,
}

/// Staff self-registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub hospital_id: String,
    pub staff_id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl SignupRequest {
    /// Mirrors the backend's own checks so obvious mistakes fail without a
    /// round trip.
    pub fn validate(&self) -> Result<(), ApiError> {
        let required = [&self.hospital_id, &self.staff_id, &self.name, &self.password];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(ApiError::invalid(
                "hospital_id, staff_id, name, and password are required",
            ));
        }
        validate_password(&self.password, "Password must be at least 6 characters")?;
        if !self.role.is_staff() {
            return Err(ApiError::invalid("Invalid role"));
        }
        Ok(())
    }
}

fn validate_password(password: &str, message: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::invalid(message));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    needs_password_reset: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl MeResponse {
    fn into_user(self) -> User {
        match self {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HospitalsResponse {
    #[serde(default)]
    hospitals: Vec<Hospital>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// The identity the user signed in with, used to complete a partial user
/// record from the server.
enum Identity {
    Staff {
        hospital_id: String,
        staff_id: String,
    },
    Patient {
        hospital_id: String,
        patient_id: String,
        contact_number: String,
    },
    Signup(SignupRequest),
}

impl Identity {
    fn fallback(&self) -> User {
        match self {
            Identity::Staff {
                hospital_id,
                staff_id,
            } => User {
                id: staff_id.clone(),
                hospital_id: Some(hospital_id.clone()),
                staff_id: Some(staff_id.clone()),
                ..User::default()
            },
            Identity::Patient {
                hospital_id,
                patient_id,
                contact_number,
            } => User {
                id: patient_id.clone(),
                role: Role::Patient,
                hospital_id: Some(hospital_id.clone()),
                patient_id: Some(patient_id.clone()),
                contact_number: Some(contact_number.clone()),
                ..User::default()
            },
            Identity::Signup(request) => User {
                id: request.staff_id.clone(),
                name: Some(request.name.clone()),
                email: request.email.clone(),
                role: request.role,
                hospital_id: Some(request.hospital_id.clone()),
                staff_id: Some(request.staff_id.clone()),
                department: request.department.clone(),
                specialization: request.specialization.clone(),
                phone: request.phone.clone(),
                ..User::default()
            },
        }
    }

    /// Completes the server's user record from what the user typed.  A
    /// patient login always yields the patient role.
    fn normalize(&self, user: Option<User>) -> User {
        let fallback = self.fallback();
        let mut user = match user {
            Some(mut user) => {
                user.fill_from(&fallback);
                user
            }
            None => fallback,
        };
        if matches!(self, Identity::Patient { .. }) {
            user.role = Role::Patient;
        }
        user
    }
}

// ── Session manager ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    error: Option<String>,
    loading: bool,
}

pub struct SessionManager {
    api: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    state: SessionState,
}

impl SessionManager {
    /// Creates a manager over `api`'s session store, restoring any persisted
    /// user.
    pub fn new(api: Arc<ApiClient>) -> Self {
        let store = api.session_store();
        let user = match store.user() {
            Ok(user) => user,
            Err(e) => {
                warn!("could not restore persisted user: {e}");
                None
            }
        };
        Self {
            api,
            store,
            state: SessionState {
                user,
                ..SessionState::default()
            },
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.user.is_some()
    }

    /// Staff login.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the previous session is left as it was.
    pub async fn login(
        &mut self,
        hospital_id: &str,
        staff_id: &str,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        self.begin();
        let body = json!({
            "hospital_id": hospital_id,
            "staff_id": staff_id,
            "password": password,
        });
        let result = self.api.post::<AuthResponse, _>("/auth/login", &body).await;
        let identity = Identity::Staff {
            hospital_id: hospital_id.to_string(),
            staff_id: staff_id.to_string(),
        };

        let response = self.settle(result)?;
        let needs_password_reset = response.needs_password_reset;
        let user = self.establish(&identity, response);
        info!(user_id = %user.id, role = ?user.role, needs_password_reset, "staff signed in");
        Ok(LoginOutcome {
            user,
            needs_password_reset,
        })
    }

    /// Patient login by patient id and registered contact number.
    pub async fn patient_login(
        &mut self,
        hospital_id: &str,
        patient_id: &str,
        contact_number: &str,
    ) -> Result<User, ApiError> {
        self.begin();
        let body = json!({
            "hospital_id": hospital_id,
            "patient_id": patient_id,
            "contact_number": contact_number,
        });
        let result = self
            .api
            .post::<AuthResponse, _>("/auth/patient-login", &body)
            .await;
        let identity = Identity::Patient {
            hospital_id: hospital_id.to_string(),
            patient_id: patient_id.to_string(),
            contact_number: contact_number.to_string(),
        };

        let response = self.settle(result)?;
        let user = self.establish(&identity, response);
        info!(user_id = %user.id, "patient signed in");
        Ok(user)
    }

    /// Registers a staff account and signs it in.
    pub async fn signup(&mut self, request: SignupRequest) -> Result<User, ApiError> {
        self.begin();
        if let Err(e) = request.validate() {
            return Err(self.fail(e));
        }

        let result = self
            .api
            .post::<AuthResponse, _>("/auth/signup", &request)
            .await;
        let response = self.settle(result)?;
        let user = self.establish(&Identity::Signup(request), response);
        info!(user_id = %user.id, role = ?user.role, "staff account created");
        Ok(user)
    }

    /// Changes the signed-in user's password and returns the server's
    /// confirmation message.
    pub async fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        self.begin();
        if let Err(e) = validate_password(
            new_password,
            "New password must be at least 6 characters",
        ) {
            return Err(self.fail(e));
        }

        let body = json!({
            "old_password": old_password,
            "new_password": new_password,
        });
        let result = self
            .api
            .post::<Option<MessageResponse>, _>("/auth/change-password", &body)
            .await;
        let response = self.settle(result)?.unwrap_or_default();
        info!("password changed");
        Ok(response
            .message
            .unwrap_or_else(|| "Password changed successfully".to_string()))
    }

    /// Re-validates the persisted token against `/auth/me`.
    ///
    /// With no token the user is cleared and `Ok(None)` is returned without
    /// contacting the server.  Any failure clears the whole persisted
    /// session.
    pub async fn refresh_user(&mut self) -> Result<Option<User>, ApiError> {
        self.begin();
        let token = match self.store.token() {
            Ok(token) => token,
            Err(e) => {
                warn!("could not read stored token: {e}");
                None
            }
        };
        if token.is_none() {
            self.state.user = None;
            self.state.loading = false;
            return Ok(None);
        }

        match self.api.get::<MeResponse>("/auth/me").await {
            Ok(response) => {
                let mut user = response.into_user();
                if let Some(previous) = &self.state.user {
                    user.fill_from(previous);
                }
                if let Err(e) = self.store.save_user(&user) {
                    warn!("failed to persist refreshed user: {e}");
                }
                self.state.user = Some(user.clone());
                self.state.loading = false;
                Ok(Some(user))
            }
            Err(e) => {
                self.clear_local();
                Err(self.fail(e))
            }
        }
    }

    /// Signs out.  Local state is cleared even when the server call fails.
    pub async fn logout(&mut self) {
        self.begin();
        if let Err(e) = self.api.post::<Value, _>("/auth/logout", &json!({})).await {
            warn!("logout request failed, clearing local session anyway: {e}");
        }
        self.clear_local();
        self.state.loading = false;
        info!("signed out");
    }

    /// Hospitals offered on the login screen.
    pub async fn load_hospitals(&mut self) -> Result<Vec<Hospital>, ApiError> {
        self.begin();
        let result = self.api.get::<HospitalsResponse>("/auth/hospitals").await;
        Ok(self.settle(result)?.hospitals)
    }

    // ── State helpers ─────────────────────────────────────────────────────────

    fn begin(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    fn settle<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        match result {
            Ok(value) => {
                self.state.loading = false;
                Ok(value)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, err: ApiError) -> ApiError {
        self.state.loading = false;
        self.state.error = Some(err.to_string());
        if err == ApiError::SessionExpired {
            self.state.user = None;
        }
        err
    }

    fn establish(&mut self, identity: &Identity, response: AuthResponse) -> User {
        let user = identity.normalize(response.user);
        if let Err(e) = self.store.save(&response.access_token, &user) {
            warn!("failed to persist session: {e}");
        }
        self.state.user = Some(user.clone());
        user
    }

    fn clear_local(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("failed to clear persisted session: {e}");
        }
        self.state.user = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
