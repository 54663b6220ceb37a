//! MongoDB store
//!
//! Embedded-collection edits are single guarded `findOneAndUpdate` calls: the
//! filter carries the precondition (like absent, entry present, caller may
//! delete) and the update is a targeted `$push`/`$pull`. Nothing is read and
//! written back, so concurrent edits to one post or profile cannot drop each
//! other. When a guard matches nothing, the current document is re-read and
//! the shared mutation rules decide which error to report.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use tracing::warn;

use crate::auth::Caller;
use crate::db::schemas::{
    normalize_email, Comment, Education, Experience, Like, PostDoc, ProfileDoc, ProfileFields,
    UserDoc, POST_COLLECTION, PROFILE_COLLECTION, USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::mutations::{post as post_rules, profile as profile_rules};
use crate::store::{PostStore, ProfileStore, Store, UserStore};
use crate::types::{ConnectorError, Result};

/// Optional profile keys cleared when an update omits them
const OPTIONAL_PROFILE_FIELDS: &[&str] = &[
    "company",
    "website",
    "location",
    "bio",
    "githubusername",
];

pub struct MongoStore {
    client: MongoClient,
    users: MongoCollection<UserDoc>,
    profiles: MongoCollection<ProfileDoc>,
    posts: MongoCollection<PostDoc>,
}

impl MongoStore {
    /// Open the three collections, creating their indexes
    pub async fn new(client: MongoClient) -> Result<Self> {
        let users = client.collection::<UserDoc>(USER_COLLECTION).await?;
        let profiles = client.collection::<ProfileDoc>(PROFILE_COLLECTION).await?;
        let posts = client.collection::<PostDoc>(POST_COLLECTION).await?;

        Ok(Self {
            client,
            users,
            profiles,
            posts,
        })
    }

    /// Run a guarded post update; on a miss, explain it with `rule`
    async fn guarded_post_update(
        &self,
        id: &ObjectId,
        guard: Document,
        update: Document,
        rule: impl FnOnce(&mut PostDoc) -> Result<()> + Send,
    ) -> Result<PostDoc> {
        if let Some(post) = self.posts.find_one_and_update(guard, update, false).await? {
            return Ok(post);
        }

        let current = self.posts.find_one(doc! { "_id": id }).await?;
        let err = explain_miss(current, || ConnectorError::NotFound("Post not found".into()), rule);
        if is_concurrent_edit(&err) {
            warn!(post = %id, "Guarded post update matched nothing but rules allow it");
        }
        Err(err)
    }

    async fn guarded_profile_update(
        &self,
        user: &ObjectId,
        guard: Document,
        update: Document,
        rule: impl FnOnce(&mut ProfileDoc) -> Result<()> + Send,
    ) -> Result<ProfileDoc> {
        if let Some(profile) = self
            .profiles
            .find_one_and_update(guard, update, false)
            .await?
        {
            return Ok(profile);
        }

        let current = self.profiles.find_one(doc! { "user": user }).await?;
        let err = explain_miss(
            current,
            || ConnectorError::NotFound("There is no profile for this user".into()),
            rule,
        );
        if is_concurrent_edit(&err) {
            warn!(user = %user, "Guarded profile update matched nothing but rules allow it");
        }
        Err(err)
    }
}

const CONCURRENT_EDIT: &str = "Document was modified concurrently, retry the request";

/// Classify a guard miss against the document as it reads now.
///
/// Absent document is `missing()`; a rule rejection is that error; a
/// document the rules would accept changed between the update and the read.
fn explain_miss<D>(
    current: Option<D>,
    missing: impl FnOnce() -> ConnectorError,
    rule: impl FnOnce(&mut D) -> Result<()>,
) -> ConnectorError {
    let Some(mut current) = current else {
        return missing();
    };
    match rule(&mut current) {
        Err(e) => e,
        Ok(()) => ConnectorError::Conflict(CONCURRENT_EDIT.into()),
    }
}

fn is_concurrent_edit(err: &ConnectorError) -> bool {
    matches!(err, ConnectorError::Conflict(msg) if msg == CONCURRENT_EDIT)
}

fn touch() -> Document {
    doc! { "metadata.updated_at": DateTime::now() }
}

/// Prepend `entry` to the array at `path`
fn push_front(path: &str, entry: Bson) -> Document {
    doc! {
        "$push": { path: { "$each": [entry], "$position": 0 } },
        "$set": touch(),
    }
}

fn pull_by(path: &str, selector: Document) -> Document {
    doc! {
        "$pull": { path: selector },
        "$set": touch(),
    }
}

/// Post exists and `user` has not liked it
pub fn like_guard(post: &ObjectId, user: &ObjectId) -> Document {
    doc! { "_id": post, "likes.user": { "$ne": user } }
}

pub fn like_update(like: &Like) -> Result<Document> {
    Ok(push_front("likes", bson::to_bson(like)?))
}

/// Post exists and `user` has liked it
pub fn unlike_guard(post: &ObjectId, user: &ObjectId) -> Document {
    doc! { "_id": post, "likes.user": user }
}

pub fn unlike_update(user: &ObjectId) -> Document {
    pull_by("likes", doc! { "user": user })
}

pub fn comment_update(comment: &Comment) -> Result<Document> {
    Ok(push_front("comments", bson::to_bson(comment)?))
}

/// Comment exists and the caller wrote it or owns the post
pub fn remove_comment_guard(post: &ObjectId, comment: &ObjectId, caller: &Caller) -> Document {
    doc! {
        "_id": post,
        "comments._id": comment,
        "$or": [
            { "user": caller.id },
            { "comments": { "$elemMatch": { "_id": comment, "user": caller.id } } },
        ],
    }
}

pub fn remove_comment_update(comment: &ObjectId) -> Document {
    pull_by("comments", doc! { "_id": comment })
}

/// Profile exists and holds an entry `id` in the array at `path`
pub fn entry_guard(user: &ObjectId, path: &str, id: &ObjectId) -> Document {
    doc! { "user": user, format!("{}._id", path): id }
}

pub fn pull_entry_update(path: &str, id: &ObjectId) -> Document {
    pull_by(path, doc! { "_id": id })
}

/// Replace scalar profile fields, leaving experience and education alone.
///
/// Omitted optional fields are unset so an update never keeps stale values.
pub fn profile_upsert_update(fields: &ProfileFields) -> Result<Document> {
    let mut set = bson::to_document(fields)?;
    set.insert("metadata.updated_at", DateTime::now());

    let mut unset = Document::new();
    for key in OPTIONAL_PROFILE_FIELDS {
        if !set.contains_key(*key) {
            unset.insert(*key, "");
        }
    }

    let mut update = doc! {
        "$set": set,
        "$setOnInsert": {
            "experience": [],
            "education": [],
            "metadata.created_at": DateTime::now(),
        },
    };
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    Ok(update)
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let id = self.users.insert_one(user.clone()).await.map_err(|e| match e {
            ConnectorError::Conflict(_) => ConnectorError::Conflict("User already exists".into()),
            other => other,
        })?;
        user._id = Some(id);
        Ok(user)
    }

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "_id": id }).await
    }

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserDoc>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.users
            .find_many(doc! { "_id": { "$in": ids } }, None)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users
            .find_one(doc! { "email": normalize_email(email) })
            .await
    }

    async fn delete_user(&self, id: &ObjectId) -> Result<bool> {
        self.users.delete_one(doc! { "_id": id }).await
    }
}

#[async_trait]
impl ProfileStore for MongoStore {
    async fn find_profile_by_user(&self, user: &ObjectId) -> Result<Option<ProfileDoc>> {
        self.profiles.find_one(doc! { "user": user }).await
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileDoc>> {
        self.profiles.find_many(Document::new(), None).await
    }

    async fn upsert_profile(&self, user: &ObjectId, fields: ProfileFields) -> Result<ProfileDoc> {
        self.profiles
            .find_one_and_update(doc! { "user": user }, profile_upsert_update(&fields)?, true)
            .await?
            .ok_or_else(|| ConnectorError::Database("Profile upsert returned nothing".into()))
    }

    async fn delete_profile_by_user(&self, user: &ObjectId) -> Result<bool> {
        self.profiles.delete_one(doc! { "user": user }).await
    }

    async fn push_experience(&self, user: &ObjectId, entry: Experience) -> Result<ProfileDoc> {
        let update = push_front("experience", bson::to_bson(&entry)?);
        self.guarded_profile_update(user, doc! { "user": user }, update, |p| {
            profile_rules::add_experience(p, entry);
            Ok(())
        })
        .await
    }

    async fn pull_experience(&self, user: &ObjectId, id: &ObjectId) -> Result<ProfileDoc> {
        self.guarded_profile_update(
            user,
            entry_guard(user, "experience", id),
            pull_entry_update("experience", id),
            |p| profile_rules::remove_experience(p, id).map(|_| ()),
        )
        .await
    }

    async fn push_education(&self, user: &ObjectId, entry: Education) -> Result<ProfileDoc> {
        let update = push_front("education", bson::to_bson(&entry)?);
        self.guarded_profile_update(user, doc! { "user": user }, update, |p| {
            profile_rules::add_education(p, entry);
            Ok(())
        })
        .await
    }

    async fn pull_education(&self, user: &ObjectId, id: &ObjectId) -> Result<ProfileDoc> {
        self.guarded_profile_update(
            user,
            entry_guard(user, "education", id),
            pull_entry_update("education", id),
            |p| profile_rules::remove_education(p, id).map(|_| ()),
        )
        .await
    }
}

#[async_trait]
impl PostStore for MongoStore {
    async fn insert_post(&self, mut post: PostDoc) -> Result<PostDoc> {
        let id = self.posts.insert_one(post.clone()).await?;
        post._id = Some(id);
        Ok(post)
    }

    async fn find_post(&self, id: &ObjectId) -> Result<Option<PostDoc>> {
        self.posts.find_one(doc! { "_id": id }).await
    }

    async fn list_posts(&self, author: Option<&ObjectId>) -> Result<Vec<PostDoc>> {
        let filter = match author {
            Some(user) => doc! { "user": user },
            None => Document::new(),
        };
        self.posts
            .find_many(filter, Some(doc! { "date": -1, "_id": -1 }))
            .await
    }

    async fn delete_post(&self, id: &ObjectId) -> Result<bool> {
        self.posts.delete_one(doc! { "_id": id }).await
    }

    async fn delete_posts_by_user(&self, user: &ObjectId) -> Result<u64> {
        self.posts.delete_many(doc! { "user": user }).await
    }

    async fn add_like(&self, post: &ObjectId, like: Like) -> Result<PostDoc> {
        let guard = like_guard(post, &like.user);
        let update = like_update(&like)?;
        self.guarded_post_update(post, guard, update, |p| post_rules::add_like(p, like))
            .await
    }

    async fn remove_like(&self, post: &ObjectId, user: &ObjectId) -> Result<PostDoc> {
        self.guarded_post_update(
            post,
            unlike_guard(post, user),
            unlike_update(user),
            |p| post_rules::remove_like(p, user),
        )
        .await
    }

    async fn add_comment(&self, post: &ObjectId, comment: Comment) -> Result<PostDoc> {
        let update = comment_update(&comment)?;
        self.guarded_post_update(post, doc! { "_id": post }, update, |p| {
            post_rules::add_comment(p, comment);
            Ok(())
        })
        .await
    }

    async fn remove_comment(
        &self,
        post: &ObjectId,
        comment: &ObjectId,
        caller: &Caller,
    ) -> Result<PostDoc> {
        self.guarded_post_update(
            post,
            remove_comment_guard(post, comment, caller),
            remove_comment_update(comment),
            |p| post_rules::remove_comment(p, comment, caller).map(|_| ()),
        )
        .await
    }
}

#[async_trait]
impl Store for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }
}
