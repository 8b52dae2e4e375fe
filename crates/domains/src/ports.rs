//! # Ports
//!
//! Every adapter must implement these traits to be wired into the binary.
//! Mocks are generated for all of them when the `testing` feature is on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Comment, CommentId, NewComment, NewPost, NewUser, Post, PostChanges, PostId, User, UserId,
};
use crate::query::{CommentQuery, Page, PageRequest, PostQuery};

/// Persistence contract for accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn find(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Missing ids are skipped; order is unspecified.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>>;
}

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post>;
    async fn find(&self, id: PostId) -> Result<Option<Post>>;
    async fn find_many(&self, ids: &[PostId]) -> Result<Vec<Post>>;
    /// Returns `None` if the post vanished before the write.
    async fn update(&self, id: PostId, changes: PostChanges) -> Result<Option<Post>>;
    /// Deletes the post and every comment attached to it.
    async fn delete(&self, id: PostId) -> Result<bool>;
    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>>;
}

/// Persistence contract for comments and replies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: NewComment) -> Result<Comment>;
    async fn find(&self, id: CommentId) -> Result<Option<Comment>>;
    async fn find_many(&self, ids: &[CommentId]) -> Result<Vec<Comment>>;
    /// Returns `None` if the comment vanished before the write.
    async fn update_content(&self, id: CommentId, content: String) -> Result<Option<Comment>>;
    /// Deletes the comment and, transitively, all of its replies.
    async fn delete(&self, id: CommentId) -> Result<bool>;
    async fn list(&self, query: &CommentQuery, page: PageRequest) -> Result<Page<Comment>>;
    /// Every comment of a post (any status, replies included), oldest first.
    async fn for_post(&self, post_id: PostId) -> Result<Vec<Comment>>;
    /// Direct replies of a comment (any status), oldest first.
    async fn replies(&self, parent_id: CommentId) -> Result<Vec<Comment>>;
}

/// Credential hashing. The hash format is opaque to the core.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String>;
    async fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// What a verified bearer token proves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Bearer token issuance, verification and revocation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn issue(&self, user_id: UserId) -> Result<IssuedToken>;
    /// Fails with `Unauthenticated` for malformed, expired or revoked tokens.
    async fn verify(&self, token: &str) -> Result<TokenClaims>;
    async fn revoke(&self, claims: &TokenClaims) -> Result<()>;
}
