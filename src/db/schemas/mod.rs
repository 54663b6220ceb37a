//! Database schemas for Connector
//!
//! Defines MongoDB document structures for users, profiles and posts.

mod metadata;
mod post;
mod profile;
mod user;

pub use metadata::Metadata;
pub use post::{Comment, Like, PostDoc, POST_COLLECTION};
pub use profile::{Education, Experience, ProfileDoc, ProfileFields, Social, PROFILE_COLLECTION};
pub use user::{gravatar_url, normalize_email, UserDoc, USER_COLLECTION};
