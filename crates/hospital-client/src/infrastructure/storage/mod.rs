//! Storage infrastructure: config file and session persistence.
//!
//! - **`config`** reads and writes the TOML `ClientConfig` in the
//!   platform config directory, with defaults on first run.
//! - **`session_file`** implements the `SessionStore` port: a JSON file for
//!   real use, an in-memory map for tests and throwaway sessions.

pub mod config;
pub mod session_file;

pub use session_file::{FileSessionStore, MemorySessionStore, TOKEN_KEY, USER_KEY};
