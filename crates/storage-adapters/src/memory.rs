//! # MemoryStore
//!
//! In-process implementation of all three repositories. All tables sit behind
//! one lock so every operation, cascades included, is atomic.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use domains::{
    Comment, CommentId, CommentQuery, CommentRepository, DomainError, NewComment, NewPost, NewUser, Page, PageRequest,
    Post, PostChanges, PostId, PostQuery, PostRepository, Result, SortOrder, User, UserId, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    last_user_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl Tables {
    /// `root` and every comment below it.
    fn thread_of(&self, root: CommentId) -> HashSet<CommentId> {
        let mut thread = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for child in self.comments.values().filter(|c| c.parent_id == Some(parent)) {
                if thread.insert(child.id) {
                    frontier.push(child.id);
                }
            }
        }
        thread
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key_order<T>(items: &mut [T], order: SortOrder, key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    match order {
        SortOrder::NewestFirst => items.sort_by(|a, b| key(b).cmp(&key(a))),
        SortOrder::OldestFirst => items.sort_by_key(|item| key(item)),
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict(format!("email {} already registered", user.email)));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId(tables.last_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id) {
            return Err(DomainError::storage(format!("post owner {} does not exist", post.user_id)));
        }

        tables.last_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: PostId(tables.last_post_id),
            title: post.title,
            content: post.content,
            status: post.status,
            user_id: post.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[PostId]) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.posts.get(id).cloned()).collect())
    }

    async fn update(&self, id: PostId, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(post);
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: PostId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables.posts.values().filter(|p| query.matches(p)).cloned().collect();
        sort_key_order(&mut posts, query.order, |p| (p.created_at, p.id.0));
        Ok(page.slice(posts))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&comment.user_id) {
            return Err(DomainError::storage(format!("comment owner {} does not exist", comment.user_id)));
        }
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(DomainError::storage(format!("post {} does not exist", comment.post_id)));
        }
        if let Some(parent_id) = comment.parent_id {
            if !tables.comments.contains_key(&parent_id) {
                return Err(DomainError::storage(format!("parent comment {parent_id} does not exist")));
            }
        }

        tables.last_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: CommentId(tables.last_comment_id),
            content: comment.content,
            status: comment.status,
            user_id: comment.user_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[CommentId]) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.comments.get(id).cloned()).collect())
    }

    async fn update_content(&self, id: CommentId, content: String) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        comment.content = content;
        comment.updated_at = Utc::now();
        Ok(Some(comment.clone()))
    }

    async fn delete(&self, id: CommentId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&id) {
            return Ok(false);
        }
        let thread = tables.thread_of(id);
        tables.comments.retain(|id, _| !thread.contains(id));
        debug!(comment_id = %id, removed = thread.len(), "comment thread deleted");
        Ok(true)
    }

    async fn list(&self, query: &CommentQuery, page: PageRequest) -> Result<Page<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| query.matches(c, tables.posts.get(&c.post_id)))
            .cloned()
            .collect();
        sort_key_order(&mut comments, query.order, |c| (c.created_at, c.id.0));
        Ok(page.slice(comments))
    }

    async fn for_post(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables.comments.values().filter(|c| c.post_id == post_id).cloned().collect();
        sort_key_order(&mut comments, SortOrder::OldestFirst, |c| (c.created_at, c.id.0));
        Ok(comments)
    }

    async fn replies(&self, parent_id: CommentId) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut replies: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect();
        sort_key_order(&mut replies, SortOrder::OldestFirst, |c| (c.created_at, c.id.0));
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{CommentStatus, PostStatus};

    async fn user(store: &MemoryStore, email: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                name: "Test User".into(),
                email: email.into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap()
    }

    async fn post(store: &MemoryStore, owner: UserId, status: PostStatus, title: &str) -> Post {
        PostRepository::insert(
            store,
            NewPost {
                title: title.into(),
                content: "Test content".into(),
                status,
                user_id: owner,
            },
        )
        .await
        .unwrap()
    }

    async fn comment(
        store: &MemoryStore,
        owner: UserId,
        post_id: PostId,
        parent_id: Option<CommentId>,
        status: CommentStatus,
    ) -> Comment {
        CommentRepository::insert(
            store,
            NewComment {
                content: "Test comment content".into(),
                status,
                user_id: owner,
                post_id,
                parent_id,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "a@example.com").await;
        let err = UserRepository::create(
            &store,
            NewUser {
                name: "Again".into(),
                email: "a@example.com".into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn feed_is_newest_first_and_paginated() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        for i in 0..20 {
            post(&store, owner.id, PostStatus::Published, &format!("post {i}")).await;
        }

        let first = PostRepository::list(&store, &PostQuery::default(), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(first.total, 20);
        assert_eq!(first.items.len(), 15);
        assert_eq!(first.items[0].title, "post 19");

        let second = PostRepository::list(&store, &PostQuery::default(), PageRequest::new(2))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.items[4].title, "post 0");
    }

    #[tokio::test]
    async fn comments_of_post_are_oldest_first_and_active_only() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let p = post(&store, owner.id, PostStatus::Published, "p").await;
        let other = post(&store, owner.id, PostStatus::Published, "other").await;

        let first = comment(&store, owner.id, p.id, None, CommentStatus::Active).await;
        comment(&store, owner.id, p.id, None, CommentStatus::Pending).await;
        let second = comment(&store, owner.id, p.id, None, CommentStatus::Active).await;
        comment(&store, owner.id, other.id, None, CommentStatus::Active).await;

        let page = CommentRepository::list(&store, &CommentQuery::of_post(p.id), PageRequest::first())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn active_comments_by_user_skip_unpublished_posts() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let published = post(&store, owner.id, PostStatus::Published, "p").await;
        let draft = post(&store, owner.id, PostStatus::Published, "d").await;

        let visible = comment(&store, owner.id, published.id, None, CommentStatus::Active).await;
        comment(&store, owner.id, draft.id, None, CommentStatus::Active).await;
        PostRepository::update(
            &store,
            draft.id,
            PostChanges {
                status: Some(PostStatus::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = CommentRepository::list(&store, &CommentQuery::active_by_user(owner.id), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, visible.id);
    }

    #[tokio::test]
    async fn deleting_a_comment_cascades_down_its_thread() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let p = post(&store, owner.id, PostStatus::Published, "p").await;

        let root = comment(&store, owner.id, p.id, None, CommentStatus::Active).await;
        let reply = comment(&store, owner.id, p.id, Some(root.id), CommentStatus::Active).await;
        let nested = comment(&store, owner.id, p.id, Some(reply.id), CommentStatus::Pending).await;
        let sibling = comment(&store, owner.id, p.id, None, CommentStatus::Active).await;

        assert!(CommentRepository::delete(&store, root.id).await.unwrap());

        for gone in [root.id, reply.id, nested.id] {
            assert!(CommentRepository::find(&store, gone).await.unwrap().is_none());
        }
        assert!(CommentRepository::find(&store, sibling.id).await.unwrap().is_some());
        assert!(!CommentRepository::delete(&store, root.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let p = post(&store, owner.id, PostStatus::Published, "p").await;
        let c = comment(&store, owner.id, p.id, None, CommentStatus::Active).await;

        assert!(PostRepository::delete(&store, p.id).await.unwrap());
        assert!(CommentRepository::find(&store, c.id).await.unwrap().is_none());
        assert!(CommentRepository::for_post(&store, p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_to_missing_parent_is_refused() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let p = post(&store, owner.id, PostStatus::Published, "p").await;

        let result = CommentRepository::insert(
            &store,
            NewComment {
                content: "orphan".into(),
                status: CommentStatus::Pending,
                user_id: owner.id,
                post_id: p.id,
                parent_id: Some(CommentId(999)),
            },
        )
        .await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }

    #[tokio::test]
    async fn search_spans_title_and_content() {
        let store = MemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        post(&store, owner.id, PostStatus::Draft, "Rust ownership").await;
        post(&store, owner.id, PostStatus::Draft, "Gardening").await;

        let query = PostQuery::feed(None, None, Some("RUST".into()));
        let page = PostRepository::list(&store, &query, PageRequest::first()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Rust ownership");
    }
}
