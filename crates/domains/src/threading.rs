//! # Comment Threading
//!
//! Lifecycle gates for creating comments and replies. Both constructors
//! return a [`NewComment`] in the `Pending` state; moderation to `Active`
//! never happens on creation.

use crate::error::{DomainError, ForbiddenReason, Result};
use crate::models::{Comment, CommentStatus, NewComment, Post};
use crate::policy::Actor;

/// Plan a top-level comment on `post`.
pub fn plan_comment(actor: &Actor, post: &Post, content: String) -> Result<NewComment> {
    if !post.is_active() {
        return Err(DomainError::Forbidden(ForbiddenReason::CommentOnInactivePost));
    }

    Ok(NewComment {
        content,
        status: CommentStatus::Pending,
        user_id: actor.user_id,
        post_id: post.id,
        parent_id: None,
    })
}

/// Plan a reply to `parent`, whose post is `parent_post`.
///
/// The reply is attached to the parent's post whatever post the caller
/// addressed. The parent is checked before its post so the two rejections
/// stay distinguishable.
pub fn plan_reply(actor: &Actor, parent: &Comment, parent_post: &Post, content: String) -> Result<NewComment> {
    debug_assert_eq!(parent.post_id, parent_post.id);

    if !parent.is_active() {
        return Err(DomainError::Forbidden(ForbiddenReason::ReplyToInactiveComment));
    }
    if !parent_post.is_active() {
        return Err(DomainError::Forbidden(ForbiddenReason::ReplyOnInactivePost));
    }

    Ok(NewComment {
        content,
        status: CommentStatus::Pending,
        user_id: actor.user_id,
        post_id: parent.post_id,
        parent_id: Some(parent.id),
    })
}
