//! Post endpoints (all require a token)
//!
//! - GET    /api/posts                         - All posts, newest first
//! - GET    /api/posts/me                      - Caller's posts
//! - GET    /api/posts/:id                     - One post
//! - POST   /api/posts                         - Create a post
//! - DELETE /api/posts/:id                     - Delete own post
//! - PUT    /api/posts/:id/likes               - Like
//! - PUT    /api/posts/:id/dislike             - Remove like
//! - POST   /api/posts/:id/comments            - Comment
//! - DELETE /api/posts/:id/comments/:comment_id - Remove comment

use bytes::Bytes;
use hyper::{HeaderMap, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{authenticate, require_owned, Caller};
use crate::db::schemas::{Comment, Like, PostDoc, UserDoc};
use crate::routes::response::{ok_json, parse_json, parse_object_id, BoxBody};
use crate::routes::views::{comment_list, post_list, PostView};
use crate::server::AppState;
use crate::types::{ConnectorError, Result};
use crate::validation::Validator;

#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl TextRequest {
    fn into_text(self) -> Result<String> {
        Validator::new()
            .required("text", self.text.as_deref(), "Text is required")
            .finish()?;
        Ok(self.text.unwrap_or_default().trim().to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub count: usize,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct DeletedPost {
    pub message: &'static str,
    pub posts: PostPage,
}

/// The caller's user record, needed for name/avatar snapshots
async fn caller_user(state: &AppState, caller: &Caller) -> Result<UserDoc> {
    state
        .store
        .find_user(&caller.id)
        .await?
        .ok_or_else(|| ConnectorError::NotFound("User not found".into()))
}

/// GET /api/posts
pub async fn list_posts(state: &AppState, headers: &HeaderMap) -> Result<Response<BoxBody>> {
    authenticate(headers, &state.jwt)?;
    let posts = state.store.list_posts(None).await?;
    Ok(ok_json(&post_list(&posts)))
}

/// GET /api/posts/me
pub async fn my_posts(state: &AppState, headers: &HeaderMap) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let posts = state.store.list_posts(Some(&caller.id)).await?;
    Ok(ok_json(&post_list(&posts)))
}

/// GET /api/posts/:id
pub async fn get_post(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Post")?;
    let post = state
        .store
        .find_post(&id)
        .await?
        .ok_or_else(|| ConnectorError::NotFound("Post not found".into()))?;

    Ok(ok_json(&PostView::from(&post)))
}

/// POST /api/posts
///
/// Responds with the caller's posts, the new one first.
pub async fn create_post(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let text = parse_json::<TextRequest>(body)?.into_text()?;
    let author = caller_user(state, &caller).await?;

    let post = state
        .store
        .insert_post(PostDoc::by(&author, caller.id, text))
        .await?;
    info!(user = %caller.id, post = ?post._id, "Created post");

    let posts = state.store.list_posts(Some(&caller.id)).await?;
    Ok(ok_json(&post_list(&posts)))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Post")?;

    let found = state.store.find_post(&id).await?;
    require_owned(found, |p| &p.user, &caller, "post")?;

    if !state.store.delete_post(&id).await? {
        return Err(ConnectorError::NotFound("Post not found".into()));
    }
    info!(user = %caller.id, post = %id, "Deleted post");

    let remaining = state.store.list_posts(Some(&caller.id)).await?;
    Ok(ok_json(&DeletedPost {
        message: "Post removed",
        posts: PostPage {
            count: remaining.len(),
            posts: post_list(&remaining),
        },
    }))
}

/// PUT /api/posts/:id/likes
pub async fn like_post(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Post")?;
    let liker = caller_user(state, &caller).await?;

    let like = Like {
        user: caller.id,
        name: Some(liker.name),
    };
    let post = state.store.add_like(&id, like).await?;
    Ok(ok_json(&PostView::from(&post)))
}

/// PUT /api/posts/:id/dislike
pub async fn unlike_post(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Post")?;

    let post = state.store.remove_like(&id, &caller.id).await?;
    Ok(ok_json(&PostView::from(&post)))
}

/// POST /api/posts/:id/comments
pub async fn add_comment(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    body: &Bytes,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Post")?;
    let text = parse_json::<TextRequest>(body)?.into_text()?;
    let author = caller_user(state, &caller).await?;

    let post = state
        .store
        .add_comment(&id, Comment::by(&author, caller.id, text))
        .await?;
    Ok(ok_json(&comment_list(&post.comments)))
}

/// DELETE /api/posts/:id/comments/:comment_id
pub async fn remove_comment(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    raw_comment_id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Post")?;
    let comment_id = parse_object_id(raw_comment_id, "Comment")?;

    let post = state.store.remove_comment(&id, &comment_id, &caller).await?;
    Ok(ok_json(&comment_list(&post.comments)))
}
