//! Connector - REST backend for a developer networking app
//!
//! Users register and sign in, keep a profile with work experience and
//! education, and publish posts that others like and comment on.
//!
//! ## Layout
//!
//! - **mutations**: Pure rules for likes, comments, experience and education
//! - **store**: Persistence traits with MongoDB and in-memory backends
//! - **routes**: JSON handlers under `/api`
//! - **server**: hyper server loop and top-level dispatch

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod mutations;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ConnectorError, Result};
