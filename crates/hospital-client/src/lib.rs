//! hospital-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does hospital-client do? (for beginners)
//!
//! The client is what a doctor, nurse, or patient runs to talk to the
//! hospital backend.  It:
//!
//! 1. Signs the user in (staff with a password, patients with their contact
//!    number) and keeps the access token and user record across restarts.
//! 2. Sends every REST call through one wrapper that attaches the token,
//!    turns error bodies into readable messages, and notices when the server
//!    says the token is no longer valid.
//! 3. Keeps a live dashboard: the staff directory synced from the server plus
//!    a locally simulated bed board and ambulance fleet.
//!
//! The layers follow the usual rule: `application` holds the use cases and
//! the ports (traits) they need, `infrastructure` holds the adapters that
//! talk to the network, the file system, and the clock.

/// Application layer: session, transport wrapper, dashboard.
pub mod application;

/// Infrastructure layer: HTTP backends, session storage, config, scheduling.
pub mod infrastructure;
