//! In-memory store
//!
//! Backs dev mode when MongoDB is unreachable, and the route tests. One
//! `RwLock` per collection; every edit runs the shared mutation rules while
//! holding the write lock, so concurrent edits to one document serialise.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use tokio::sync::RwLock;

use crate::auth::Caller;
use crate::db::schemas::{
    normalize_email, Comment, Education, Experience, Like, PostDoc, ProfileDoc, ProfileFields,
    UserDoc,
};
use crate::mutations::{post as post_rules, profile as profile_rules};
use crate::store::{PostStore, ProfileStore, Store, UserStore};
use crate::types::{ConnectorError, Result};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<ObjectId, UserDoc>>,
    /// Keyed by owning user
    profiles: RwLock<BTreeMap<ObjectId, ProfileDoc>>,
    posts: RwLock<BTreeMap<ObjectId, PostDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn edit_profile<R>(
        &self,
        user: &ObjectId,
        edit: impl FnOnce(&mut ProfileDoc) -> Result<R> + Send,
    ) -> Result<ProfileDoc> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user)
            .ok_or_else(|| ConnectorError::NotFound("There is no profile for this user".into()))?;

        // Work on a copy so a rejected edit leaves the stored document as-is
        let mut edited = profile.clone();
        edit(&mut edited)?;
        edited.metadata.touch();
        *profile = edited.clone();
        Ok(edited)
    }

    async fn edit_post<R>(
        &self,
        id: &ObjectId,
        edit: impl FnOnce(&mut PostDoc) -> Result<R> + Send,
    ) -> Result<PostDoc> {
        let mut posts = self.posts.write().await;
        let post = posts
            .get_mut(id)
            .ok_or_else(|| ConnectorError::NotFound("Post not found".into()))?;

        let mut edited = post.clone();
        edit(&mut edited)?;
        edited.metadata.touch();
        *post = edited.clone();
        Ok(edited)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(ConnectorError::Conflict("User already exists".into()));
        }

        let id = *user._id.get_or_insert_with(ObjectId::new);
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserDoc>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn delete_user(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile_by_user(&self, user: &ObjectId) -> Result<Option<ProfileDoc>> {
        Ok(self.profiles.read().await.get(user).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileDoc>> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }

    async fn upsert_profile(&self, user: &ObjectId, fields: ProfileFields) -> Result<ProfileDoc> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.entry(*user).or_insert_with(|| {
            let mut fresh = ProfileDoc::new(*user, fields.clone());
            fresh._id = Some(ObjectId::new());
            fresh
        });

        profile.fields = fields;
        profile.metadata.updated_at = Some(DateTime::now());
        Ok(profile.clone())
    }

    async fn delete_profile_by_user(&self, user: &ObjectId) -> Result<bool> {
        Ok(self.profiles.write().await.remove(user).is_some())
    }

    async fn push_experience(&self, user: &ObjectId, entry: Experience) -> Result<ProfileDoc> {
        self.edit_profile(user, |p| {
            profile_rules::add_experience(p, entry);
            Ok(())
        })
        .await
    }

    async fn pull_experience(&self, user: &ObjectId, id: &ObjectId) -> Result<ProfileDoc> {
        self.edit_profile(user, |p| profile_rules::remove_experience(p, id))
            .await
    }

    async fn push_education(&self, user: &ObjectId, entry: Education) -> Result<ProfileDoc> {
        self.edit_profile(user, |p| {
            profile_rules::add_education(p, entry);
            Ok(())
        })
        .await
    }

    async fn pull_education(&self, user: &ObjectId, id: &ObjectId) -> Result<ProfileDoc> {
        self.edit_profile(user, |p| profile_rules::remove_education(p, id))
            .await
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, mut post: PostDoc) -> Result<PostDoc> {
        let id = *post._id.get_or_insert_with(ObjectId::new);
        self.posts.write().await.insert(id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: &ObjectId) -> Result<Option<PostDoc>> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn list_posts(&self, author: Option<&ObjectId>) -> Result<Vec<PostDoc>> {
        let posts = self.posts.read().await;
        let mut listed: Vec<PostDoc> = posts
            .values()
            .filter(|p| author.map_or(true, |a| p.user == *a))
            .cloned()
            .collect();

        // ObjectIds grow with creation time, so they break date ties newest-first too
        listed.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b._id.cmp(&a._id)));
        Ok(listed)
    }

    async fn delete_post(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.posts.write().await.remove(id).is_some())
    }

    async fn delete_posts_by_user(&self, user: &ObjectId) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|_, p| p.user != *user);
        Ok((before - posts.len()) as u64)
    }

    async fn add_like(&self, post: &ObjectId, like: Like) -> Result<PostDoc> {
        self.edit_post(post, |p| post_rules::add_like(p, like)).await
    }

    async fn remove_like(&self, post: &ObjectId, user: &ObjectId) -> Result<PostDoc> {
        self.edit_post(post, |p| post_rules::remove_like(p, user))
            .await
    }

    async fn add_comment(&self, post: &ObjectId, comment: Comment) -> Result<PostDoc> {
        self.edit_post(post, |p| {
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
        self.edit_post(post, |p| post_rules::remove_comment(p, comment, caller))
            .await
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn seeded_user(store: &MemoryStore, name: &str) -> (ObjectId, UserDoc) {
        let user = store
            .insert_user(UserDoc::new(
                name.into(),
                &format!("{}@example.com", name),
                "hash".into(),
            ))
            .await
            .unwrap();
        (user._id.unwrap(), user)
    }

    fn fields(status: &str) -> ProfileFields {
        ProfileFields {
            status: status.into(),
            skills: vec!["RUST".into()],
            ..ProfileFields::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        seeded_user(&store, "ann").await;

        let again = UserDoc::new("Other".into(), "ANN@example.com", "hash".into());
        let result = store.insert_user(again).await;
        assert!(matches!(result, Err(ConnectorError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_user_by_email_normalises() {
        let store = MemoryStore::new();
        let (id, _) = seeded_user(&store, "ann").await;
        let found = store.find_user_by_email(" Ann@Example.com ").await.unwrap();
        assert_eq!(found.unwrap()._id, Some(id));
    }

    #[tokio::test]
    async fn test_upsert_keeps_embedded_history() {
        let store = MemoryStore::new();
        let user = ObjectId::new();

        store.upsert_profile(&user, fields("Junior")).await.unwrap();
        let job = Experience {
            _id: ObjectId::new(),
            title: "Dev".into(),
            company: "Acme".into(),
            location: None,
            from: "2020-01-01".into(),
            to: None,
            current: true,
            description: None,
        };
        store.push_experience(&user, job).await.unwrap();

        let updated = store.upsert_profile(&user, fields("Senior")).await.unwrap();
        assert_eq!(updated.fields.status, "Senior");
        assert_eq!(updated.experience.len(), 1);
        assert_eq!(store.list_profiles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_without_profile_not_found() {
        let store = MemoryStore::new();
        let result = store
            .pull_education(&ObjectId::new(), &ObjectId::new())
            .await;
        assert!(matches!(result, Err(ConnectorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejected_edit_leaves_post_untouched() {
        let store = MemoryStore::new();
        let (author_id, author) = seeded_user(&store, "author").await;
        let post = store
            .insert_post(PostDoc::by(&author, author_id, "hi".into()))
            .await
            .unwrap();
        let post_id = post._id.unwrap();

        let result = store.remove_like(&post_id, &author_id).await;
        assert!(matches!(result, Err(ConnectorError::InvalidState(_))));
        assert_eq!(store.find_post(&post_id).await.unwrap().unwrap(), post);
    }

    #[tokio::test]
    async fn test_list_posts_newest_first_and_by_author() {
        let store = MemoryStore::new();
        let (a_id, a) = seeded_user(&store, "a").await;
        let (b_id, b) = seeded_user(&store, "b").await;

        let mut old = PostDoc::by(&a, a_id, "old".into());
        old.date = DateTime::from_millis(1_000);
        store.insert_post(old).await.unwrap();
        store
            .insert_post(PostDoc::by(&b, b_id, "new".into()))
            .await
            .unwrap();

        let all = store.list_posts(None).await.unwrap();
        let texts: Vec<_> = all.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["new", "old"]);

        let mine = store.list_posts(Some(&a_id)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].text, "old");

        assert_eq!(store.delete_posts_by_user(&a_id).await.unwrap(), 1);
        assert_eq!(store.list_posts(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let (author_id, author) = seeded_user(&store, "author").await;
        let post_id = store
            .insert_post(PostDoc::by(&author, author_id, "hi".into()))
            .await
            .unwrap()
            ._id
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let like = Like {
                        user: ObjectId::new(),
                        name: None,
                    };
                    store.add_like(&post_id, like).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let post = store.find_post(&post_id).await.unwrap().unwrap();
        assert_eq!(post.likes.len(), 16);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_like_admits_one() {
        let store = Arc::new(MemoryStore::new());
        let (author_id, author) = seeded_user(&store, "author").await;
        let post_id = store
            .insert_post(PostDoc::by(&author, author_id, "hi".into()))
            .await
            .unwrap()
            ._id
            .unwrap();
        let liker = ObjectId::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let like = Like {
                        user: liker,
                        name: None,
                    };
                    store.add_like(&post_id, like).await
                })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 1);
        let post = store.find_post(&post_id).await.unwrap().unwrap();
        assert_eq!(post.likes.len(), 1);
    }
}
