//! Shared types for Connector

pub mod error;

pub use error::{ConnectorError, FieldError, Result};
