//! # Visibility Queries
//!
//! Explicit filter specs for every read view. Stores consume a spec through a
//! single parameterized builder (SQL in `PgStore`, [`PostQuery::matches`] /
//! [`CommentQuery::matches`] in `MemoryStore`), so every view has one
//! definition shared by all backends.

use serde::Serialize;

use crate::models::{Comment, CommentId, CommentStatus, Post, PostId, PostStatus, UserId};

/// Fixed page size of every list view.
pub const PER_PAGE: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// `created_at DESC, id DESC`
    #[default]
    NewestFirst,
    /// `created_at ASC, id ASC` (chronological reading order)
    OldestFirst,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub user_id: Option<UserId>,
    /// Case-insensitive substring of title OR content
    pub search: Option<String>,
    pub order: SortOrder,
}

impl PostQuery {
    /// Public feed with optional filters, newest first.
    pub fn feed(status: Option<PostStatus>, user_id: Option<UserId>, search: Option<String>) -> Self {
        Self {
            status,
            user_id,
            search: search.filter(|s| !s.is_empty()),
            order: SortOrder::NewestFirst,
        }
    }

    /// Published posts of one author.
    pub fn active_by_user(user_id: UserId) -> Self {
        Self {
            status: Some(PostStatus::Published),
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Every post of one author, any status.
    pub fn owned_by(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|status| post.status != status) {
            return false;
        }
        if self.user_id.is_some_and(|user_id| post.user_id != user_id) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                post.title.to_lowercase().contains(&needle) || post.content.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentQuery {
    pub status: Option<CommentStatus>,
    pub user_id: Option<UserId>,
    pub post_id: Option<PostId>,
    pub parent_id: Option<CommentId>,
    /// Only comments with a parent
    pub replies_only: bool,
    /// Only comments whose post is published
    pub post_published: bool,
    pub order: SortOrder,
}

impl CommentQuery {
    /// Public feed with optional filters, newest first.
    pub fn feed(
        status: Option<CommentStatus>,
        user_id: Option<UserId>,
        post_id: Option<PostId>,
        replies_only: bool,
    ) -> Self {
        Self {
            status,
            user_id,
            post_id,
            replies_only,
            ..Self::default()
        }
    }

    /// Active comments of one post in reading order.
    pub fn of_post(post_id: PostId) -> Self {
        Self {
            status: Some(CommentStatus::Active),
            post_id: Some(post_id),
            order: SortOrder::OldestFirst,
            ..Self::default()
        }
    }

    /// Active direct replies of one comment in reading order.
    pub fn replies_of(parent_id: CommentId) -> Self {
        Self {
            status: Some(CommentStatus::Active),
            parent_id: Some(parent_id),
            order: SortOrder::OldestFirst,
            ..Self::default()
        }
    }

    /// Every active reply across all posts, newest first.
    pub fn all_replies() -> Self {
        Self {
            status: Some(CommentStatus::Active),
            replies_only: true,
            ..Self::default()
        }
    }

    /// Active comments of one author on published posts.
    pub fn active_by_user(user_id: UserId) -> Self {
        Self {
            status: Some(CommentStatus::Active),
            user_id: Some(user_id),
            post_published: true,
            ..Self::default()
        }
    }

    /// Every comment of one author, any status.
    pub fn owned_by(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// `post` is the comment's post as currently stored, if it still exists.
    pub fn matches(&self, comment: &Comment, post: Option<&Post>) -> bool {
        if self.status.is_some_and(|status| comment.status != status) {
            return false;
        }
        if self.user_id.is_some_and(|user_id| comment.user_id != user_id) {
            return false;
        }
        if self.post_id.is_some_and(|post_id| comment.post_id != post_id) {
            return false;
        }
        if self.parent_id.is_some_and(|parent_id| comment.parent_id != Some(parent_id)) {
            return false;
        }
        if self.replies_only && !comment.is_reply() {
            return false;
        }
        if self.post_published && !post.is_some_and(Post::is_active) {
            return false;
        }
        true
    }
}

/// 1-based page selector; page size is always [`PER_PAGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
}

impl PageRequest {
    pub fn new(page: u32) -> Self {
        Self { page: page.max(1) }
    }

    pub fn first() -> Self {
        Self::new(1)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        PER_PAGE
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(PER_PAGE)
    }

    /// Cut one page out of an already filtered and sorted result set.
    pub fn slice<T>(&self, all: Vec<T>) -> Page<T> {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(self.offset() as usize)
            .take(PER_PAGE as usize)
            .collect();
        Page::new(items, *self, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            per_page: request.per_page(),
            total,
        }
    }

    /// Never below 1, even for an empty result.
    pub fn last_page(&self) -> u32 {
        let per_page = u64::from(self.per_page.max(1));
        (self.total.div_ceil(per_page)).max(1) as u32
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(id: i64, owner: i64, status: PostStatus, title: &str) -> Post {
        Post {
            id: PostId(id),
            title: title.into(),
            content: "Body text".into(),
            status,
            user_id: UserId(owner),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(id: i64, owner: i64, post: i64, parent: Option<i64>, status: CommentStatus) -> Comment {
        Comment {
            id: CommentId(id),
            content: "c".into(),
            status,
            user_id: UserId(owner),
            post_id: PostId(post),
            parent_id: parent.map(CommentId),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn feed_search_matches_title_or_content_ignoring_case() {
        let q = PostQuery::feed(None, None, Some("rust".into()));
        assert!(q.matches(&post(1, 1, PostStatus::Draft, "Learning Rust")));
        assert!(!q.matches(&post(2, 1, PostStatus::Draft, "Learning Go")));

        let q = PostQuery::feed(None, None, Some("BODY".into()));
        assert!(q.matches(&post(3, 1, PostStatus::Draft, "x")));
    }

    #[test]
    fn empty_search_is_ignored() {
        assert_eq!(PostQuery::feed(None, None, Some(String::new())).search, None);
    }

    #[test]
    fn active_by_user_requires_published_and_owner() {
        let q = PostQuery::active_by_user(UserId(1));
        assert!(q.matches(&post(1, 1, PostStatus::Published, "a")));
        assert!(!q.matches(&post(2, 1, PostStatus::Draft, "a")));
        assert!(!q.matches(&post(3, 2, PostStatus::Published, "a")));
    }

    #[test]
    fn comments_of_post_are_active_and_scoped() {
        let q = CommentQuery::of_post(PostId(1));
        assert_eq!(q.order, SortOrder::OldestFirst);
        assert!(q.matches(&comment(1, 1, 1, None, CommentStatus::Active), None));
        assert!(!q.matches(&comment(2, 1, 1, None, CommentStatus::Pending), None));
        assert!(!q.matches(&comment(3, 1, 2, None, CommentStatus::Active), None));
    }

    #[test]
    fn replies_views_only_take_replies() {
        let reply = comment(2, 1, 1, Some(1), CommentStatus::Active);
        let top = comment(1, 1, 1, None, CommentStatus::Active);

        assert!(CommentQuery::all_replies().matches(&reply, None));
        assert!(!CommentQuery::all_replies().matches(&top, None));
        assert!(CommentQuery::replies_of(CommentId(1)).matches(&reply, None));
        assert!(!CommentQuery::replies_of(CommentId(5)).matches(&reply, None));
    }

    #[test]
    fn active_comments_by_user_need_published_post() {
        let q = CommentQuery::active_by_user(UserId(7));
        let c = comment(1, 7, 1, None, CommentStatus::Active);
        assert!(q.matches(&c, Some(&post(1, 1, PostStatus::Published, "p"))));
        assert!(!q.matches(&c, Some(&post(1, 1, PostStatus::Draft, "p"))));
        assert!(!q.matches(&c, None));
    }

    #[test]
    fn page_request_clamps_and_slices() {
        assert_eq!(PageRequest::new(0).page(), 1);

        let page = PageRequest::new(2).slice((1..=40).collect::<Vec<_>>());
        assert_eq!(page.items.first(), Some(&16));
        assert_eq!(page.items.len(), 15);
        assert_eq!(page.total, 40);
        assert_eq!(page.last_page(), 3);
    }

    #[test]
    fn empty_page_still_has_one_page() {
        let page = PageRequest::first().slice(Vec::<u8>::new());
        assert_eq!(page.last_page(), 1);
        assert!(page.items.is_empty());
    }
}
