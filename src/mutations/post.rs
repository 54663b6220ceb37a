//! Likes and comments on a post

use bson::oid::ObjectId;

use crate::auth::Caller;
use crate::db::schemas::{Comment, Like, PostDoc};
use crate::mutations::{find_by_key, prepend, remove_by_key};
use crate::types::ConnectorError;

/// Whether `user` already holds a like on the post (by id, never by name)
pub fn has_liked(post: &PostDoc, user: &ObjectId) -> bool {
    post.likes.iter().any(|like| like.user == *user)
}

/// Add `like` at the front. A second like from the same user is a `Conflict`.
pub fn add_like(post: &mut PostDoc, like: Like) -> Result<(), ConnectorError> {
    if has_liked(post, &like.user) {
        return Err(ConnectorError::Conflict(
            "You have liked this post already".into(),
        ));
    }

    prepend(&mut post.likes, like);
    Ok(())
}

/// Drop the user's like. Unliking a post never liked is `InvalidState`.
pub fn remove_like(post: &mut PostDoc, user: &ObjectId) -> Result<(), ConnectorError> {
    let before = post.likes.len();
    post.likes.retain(|like| like.user != *user);

    if post.likes.len() == before {
        return Err(ConnectorError::InvalidState(
            "Post has not yet been liked".into(),
        ));
    }
    Ok(())
}

/// Comments always succeed and land first
pub fn add_comment(post: &mut PostDoc, comment: Comment) {
    prepend(&mut post.comments, comment);
}

/// Whether `caller` may delete the comment: its author or the post's author
pub fn may_remove_comment(post: &PostDoc, comment: &Comment, caller: &Caller) -> bool {
    caller.owns(&comment.user) || caller.owns(&post.user)
}

/// Remove a comment by id, enforcing the dual-ownership rule.
///
/// Missing comment is `NotFound`; anyone but the comment or post author is
/// `Forbidden`. The post is untouched on error.
pub fn remove_comment(
    post: &mut PostDoc,
    comment_id: &ObjectId,
    caller: &Caller,
) -> Result<Comment, ConnectorError> {
    let (_, comment) = find_by_key(&post.comments, comment_id, "comment")?;

    if !may_remove_comment(post, comment, caller) {
        return Err(ConnectorError::Forbidden(
            "User not authorized to delete this comment".into(),
        ));
    }

    remove_by_key(&mut post.comments, comment_id, "comment")
}
