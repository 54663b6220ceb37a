//! Persistence interface
//!
//! Routes only see these traits. Two backends implement them: MongoDB for
//! production and a lock-guarded in-memory store for dev mode and tests.
//! Every embedded-collection edit is a single atomic operation on one
//! document and returns the document as it is afterwards.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::auth::Caller;
use crate::db::schemas::{
    Comment, Education, Experience, Like, PostDoc, ProfileDoc, ProfileFields, UserDoc,
};
use crate::types::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A taken email is `Conflict`.
    async fn insert_user(&self, user: UserDoc) -> Result<UserDoc>;

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>>;

    /// Batch lookup for populating profile owners; unknown ids are skipped
    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserDoc>>;

    /// Lookup by normalised email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    async fn delete_user(&self, id: &ObjectId) -> Result<bool>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile_by_user(&self, user: &ObjectId) -> Result<Option<ProfileDoc>>;

    async fn list_profiles(&self) -> Result<Vec<ProfileDoc>>;

    /// Create the user's profile or replace its scalar fields.
    ///
    /// Experience and education survive an update untouched.
    async fn upsert_profile(&self, user: &ObjectId, fields: ProfileFields) -> Result<ProfileDoc>;

    async fn delete_profile_by_user(&self, user: &ObjectId) -> Result<bool>;

    async fn push_experience(&self, user: &ObjectId, entry: Experience) -> Result<ProfileDoc>;

    async fn pull_experience(&self, user: &ObjectId, id: &ObjectId) -> Result<ProfileDoc>;

    async fn push_education(&self, user: &ObjectId, entry: Education) -> Result<ProfileDoc>;

    async fn pull_education(&self, user: &ObjectId, id: &ObjectId) -> Result<ProfileDoc>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: PostDoc) -> Result<PostDoc>;

    async fn find_post(&self, id: &ObjectId) -> Result<Option<PostDoc>>;

    /// All posts, or one author's, newest first
    async fn list_posts(&self, author: Option<&ObjectId>) -> Result<Vec<PostDoc>>;

    async fn delete_post(&self, id: &ObjectId) -> Result<bool>;

    async fn delete_posts_by_user(&self, user: &ObjectId) -> Result<u64>;

    /// Add a like; a second like from the same user is `Conflict`
    async fn add_like(&self, post: &ObjectId, like: Like) -> Result<PostDoc>;

    /// Remove the user's like; `InvalidState` if there was none
    async fn remove_like(&self, post: &ObjectId, user: &ObjectId) -> Result<PostDoc>;

    async fn add_comment(&self, post: &ObjectId, comment: Comment) -> Result<PostDoc>;

    /// Remove a comment if `caller` wrote it or owns the post
    async fn remove_comment(
        &self,
        post: &ObjectId,
        comment: &ObjectId,
        caller: &Caller,
    ) -> Result<PostDoc>;
}

/// Full persistence backend
#[async_trait]
pub trait Store: UserStore + ProfileStore + PostStore {
    /// Short backend name for logs and the readiness probe
    fn backend(&self) -> &'static str;

    /// Check the backend can serve requests
    async fn ping(&self) -> Result<()>;
}
