//! Post document schema
//!
//! Author name and avatar on posts, likes and comments are point-in-time
//! snapshots taken at creation; later user edits do not reach them.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{Metadata, UserDoc};

/// Collection name for posts
pub const POST_COLLECTION: &str = "posts";

/// One user's like on a post
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Like {
    pub user: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A comment embedded in a post
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    pub _id: ObjectId,
    pub user: ObjectId,
    pub text: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub date: DateTime,
}

impl Comment {
    /// New comment by `author`, with a fresh id and the current time
    pub fn by(author: &UserDoc, author_id: ObjectId, text: String) -> Self {
        Self {
            _id: ObjectId::new(),
            user: author_id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            date: DateTime::now(),
        }
    }
}

/// Post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PostDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Author
    pub user: ObjectId,

    pub text: String,

    /// Author name snapshot
    #[serde(default)]
    pub name: String,

    /// Author avatar snapshot
    #[serde(default)]
    pub avatar: String,

    #[serde(default)]
    pub likes: Vec<Like>,

    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Creation time; list order is newest first on this field
    pub date: DateTime,
}

impl PostDoc {
    /// New post by `author`, snapshotting their display fields
    pub fn by(author: &UserDoc, author_id: ObjectId, text: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user: author_id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            likes: Vec::new(),
            comments: Vec::new(),
            date: DateTime::now(),
        }
    }
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user": 1, "date": -1 },
                Some(
                    IndexOptions::builder()
                        .name("user_date_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "date": -1 },
                Some(IndexOptions::builder().name("date_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for PostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
