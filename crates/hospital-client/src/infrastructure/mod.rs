//! Infrastructure layer for the client.
//!
//! Contains the adapters behind the application ports: the HTTP backend,
//! session persistence, the config file, and tick scheduling.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `hospital_core`, but MUST NOT be imported by the `application` layer
//! (tests excepted).
//!
//! # Sub-modules
//!
//! - **`transport`** – `ReqwestBackend`, the production `HttpBackend`, and a
//!   scripted `MockHttpBackend` for tests.
//!
//! - **`storage`** – `FileSessionStore` / `MemorySessionStore` for the
//!   `token` and `user` keys, and the TOML `ClientConfig`.
//!
//! - **`scheduler`** – `IntervalTicks` and `ManualTicks`, the two
//!   `TickSource` implementations.

pub mod scheduler;
pub mod storage;
pub mod transport;
