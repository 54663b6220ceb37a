//! HTTP server for Connector

pub mod http;

pub use http::{dispatch, run, AppState};
