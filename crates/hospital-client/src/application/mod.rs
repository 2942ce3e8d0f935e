//! Application layer use cases for the client.
//!
//! - **`api`** – `ApiClient`, the single entry point for REST calls.  The
//!   actual HTTP exchange is made by an `HttpBackend` implementation that is
//!   injected at construction time.
//!
//! - **`session`** – `SessionManager`: login variants, signup, password
//!   change, refresh, logout.  Persistence goes through the `SessionStore`
//!   port.
//!
//! - **`dashboard`** – `DashboardService`: owns the shared `HospitalStore`,
//!   syncs staff from the server, and drives the telemetry simulation from a
//!   `TickSource`.

pub mod api;
pub mod dashboard;
pub mod session;
