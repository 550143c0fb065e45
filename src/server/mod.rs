//! HTTP server for Gatehouse

pub mod http;

pub use http::{run, serve, AppState};
