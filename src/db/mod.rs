//! Database layer for Connector
//!
//! MongoDB client wrapper and the document schemas stored through it.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{PostDoc, ProfileDoc, UserDoc};
