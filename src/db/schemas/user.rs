//! User document schema
//!
//! Stores account credentials plus the display fields other documents snapshot.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    /// Login identifier, stored trimmed and lower-cased
    pub email: String,

    /// Argon2 password hash (PHC string)
    pub password_hash: String,

    /// Gravatar URL derived from the email at registration
    pub avatar: String,
}

impl UserDoc {
    /// Create a new user document; the email is normalised and the avatar derived from it
    pub fn new(name: String, email: &str, password_hash: String) -> Self {
        let email = normalize_email(email);
        let avatar = gravatar_url(&email);
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            email,
            password_hash,
            avatar,
        }
    }
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Gravatar URL for an email (SHA-256 hash, 200px, PG rating, mystery-man fallback)
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm",
        hex::encode(digest)
    )
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
