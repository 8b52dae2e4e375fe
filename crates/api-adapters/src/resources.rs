//! JSON shapes of users, posts and comments.
//!
//! Related records are present only when the view loaded them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use domains::{Comment, CommentStatus, Post, PostStatus, User};
use services::{CommentView, PostView};

#[derive(Debug, Serialize)]
pub struct UserResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResource {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResource {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentResource>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResource {
    fn bare(post: Post) -> Self {
        Self {
            id: post.id.0,
            is_active: post.is_active(),
            title: post.title,
            content: post.content,
            status: post.status,
            user: None,
            comments: None,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostView> for PostResource {
    fn from(view: PostView) -> Self {
        Self {
            user: view.author.map(UserResource::from),
            comments: view
                .comments
                .map(|comments| comments.into_iter().map(CommentResource::from).collect()),
            ..Self::bare(view.post)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResource {
    pub id: i64,
    pub content: String,
    pub status: CommentStatus,
    pub is_active: bool,
    pub is_reply: bool,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<CommentResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentResource>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResource {
    fn bare(comment: Comment) -> Self {
        Self {
            id: comment.id.0,
            is_active: comment.is_active(),
            is_reply: comment.is_reply(),
            content: comment.content,
            status: comment.status,
            post_id: comment.post_id.0,
            parent_id: comment.parent_id.map(|id| id.0),
            user: None,
            post: None,
            parent: None,
            replies: None,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

impl From<CommentView> for CommentResource {
    fn from(view: CommentView) -> Self {
        Self {
            user: view.author.map(UserResource::from),
            post: view.post.map(PostResource::bare),
            parent: view.parent.map(|parent| Box::new(CommentResource::bare(parent))),
            replies: view
                .replies
                .map(|replies| replies.into_iter().map(CommentResource::from).collect()),
            ..Self::bare(view.comment)
        }
    }
}
