//! `HttpBackend` implementations.

pub mod mock;
pub mod reqwest_backend;

pub use reqwest_backend::ReqwestBackend;
