//! Read views: entities together with the related records a response embeds.
//!
//! Related records are batch-loaded by id through the ports; nothing here
//! follows object links.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use domains::{
    Comment, CommentId, CommentRepository, DomainError, Entity, Page, Post, PostId, PostRepository, Result, User,
    UserId, UserRepository,
};

#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author: Option<User>,
    /// Loaded on the detail view only
    pub comments: Option<Vec<CommentView>>,
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Option<User>,
    pub post: Option<Post>,
    pub parent: Option<Comment>,
    /// Loaded on detail views only
    pub replies: Option<Vec<CommentView>>,
}

impl CommentView {
    fn bare(comment: Comment, author: Option<User>) -> Self {
        Self {
            comment,
            author,
            post: None,
            parent: None,
            replies: None,
        }
    }
}

/// The three repositories every service reads through.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

fn distinct<K: Copy + Eq + Hash>(ids: impl IntoIterator<Item = K>) -> Vec<K> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

impl Repositories {
    async fn authors(&self, ids: impl IntoIterator<Item = UserId>) -> Result<HashMap<UserId, User>> {
        let ids = distinct(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.users.find_many(&ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn posts_by_id(&self, ids: impl IntoIterator<Item = PostId>) -> Result<HashMap<PostId, Post>> {
        let ids = distinct(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let posts = self.posts.find_many(&ids).await?;
        Ok(posts.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn comments_by_id(&self, ids: impl IntoIterator<Item = CommentId>) -> Result<HashMap<CommentId, Comment>> {
        let ids = distinct(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let comments = self.comments.find_many(&ids).await?;
        Ok(comments.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Posts with their authors.
    pub async fn post_views(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let authors = self.authors(posts.iter().map(|p| p.user_id)).await?;
        Ok(posts
            .into_iter()
            .map(|post| PostView {
                author: authors.get(&post.user_id).cloned(),
                post,
                comments: None,
            })
            .collect())
    }

    pub async fn post_page(&self, page: Page<Post>) -> Result<Page<PostView>> {
        let Page { items, page, per_page, total } = page;
        let items = self.post_views(items).await?;
        Ok(Page { items, page, per_page, total })
    }

    /// Post with author and every comment of the post, each with its direct replies.
    pub async fn post_detail(&self, post: Post) -> Result<PostView> {
        let comments = self.comments.for_post(post.id).await?;
        let authors = self
            .authors(std::iter::once(post.user_id).chain(comments.iter().map(|c| c.user_id)))
            .await?;

        let mut replies: HashMap<CommentId, Vec<CommentView>> = HashMap::new();
        for reply in &comments {
            if let Some(parent_id) = reply.parent_id {
                replies
                    .entry(parent_id)
                    .or_default()
                    .push(CommentView::bare(reply.clone(), authors.get(&reply.user_id).cloned()));
            }
        }

        let comments = comments
            .into_iter()
            .map(|comment| {
                let author = authors.get(&comment.user_id).cloned();
                let replies = replies.get(&comment.id).cloned().unwrap_or_default();
                CommentView {
                    replies: Some(replies),
                    ..CommentView::bare(comment, author)
                }
            })
            .collect();

        Ok(PostView {
            author: authors.get(&post.user_id).cloned(),
            post,
            comments: Some(comments),
        })
    }

    /// Comments with their author, post and parent.
    pub async fn comment_views(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>> {
        let authors = self.authors(comments.iter().map(|c| c.user_id)).await?;
        let posts = self.posts_by_id(comments.iter().map(|c| c.post_id)).await?;
        let parents = self.comments_by_id(comments.iter().filter_map(|c| c.parent_id)).await?;

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                author: authors.get(&comment.user_id).cloned(),
                post: posts.get(&comment.post_id).cloned(),
                parent: comment.parent_id.and_then(|id| parents.get(&id).cloned()),
                replies: None,
                comment,
            })
            .collect())
    }

    pub async fn comment_view(&self, comment: Comment) -> Result<CommentView> {
        let id = comment.id;
        self.comment_views(vec![comment])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found(Entity::Comment, id))
    }

    pub async fn comment_page(&self, page: Page<Comment>) -> Result<Page<CommentView>> {
        let Page { items, page, per_page, total } = page;
        let items = self.comment_views(items).await?;
        Ok(Page { items, page, per_page, total })
    }

    /// Comment with author, post, parent and every direct reply (with authors).
    pub async fn comment_detail(&self, comment: Comment) -> Result<CommentView> {
        let replies = self.comments.replies(comment.id).await?;
        let authors = self.authors(replies.iter().map(|r| r.user_id)).await?;
        let replies = replies
            .into_iter()
            .map(|reply| {
                let author = authors.get(&reply.user_id).cloned();
                CommentView::bare(reply, author)
            })
            .collect();

        let mut view = self.comment_view(comment).await?;
        view.replies = Some(replies);
        Ok(view)
    }
}
