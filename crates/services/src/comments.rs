//! Comment use cases: commenting, replying, editing, deleting and the
//! comment read views.

use tracing::{info, instrument, warn};

use domains::policy::{self, Action};
use domains::threading;
use domains::{
    Actor, Comment, CommentId, CommentQuery, DomainError, Entity, Page, PageRequest, Post, PostId, Result, UserId,
    ValidationErrors,
};

use crate::input::{CommentFeedParams, CreateComment, UpdateComment};
use crate::views::{CommentView, Repositories};

#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
}

impl CommentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn load(&self, id: CommentId) -> Result<Comment> {
        self.repos
            .comments
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Comment, id))
    }

    async fn load_post(&self, id: PostId) -> Result<Post> {
        self.repos
            .posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Post, id))
    }

    /// Comment on `post_id`. With a `parent_id` in the body this is a reply:
    /// the reply gates apply and the addressed post is ignored.
    #[instrument(skip(self, input), fields(user_id = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, post_id: PostId, input: CreateComment) -> Result<CommentView> {
        let (content, parent_id) = input.validate()?;

        if let Some(parent_id) = parent_id {
            let parent = self.repos.comments.find(parent_id).await?.ok_or_else(|| {
                DomainError::Validation(ValidationErrors::single("parent_id", "parent comment not found"))
            })?;
            return self.reply_to(actor, parent, content).await;
        }

        let post = self.load_post(post_id).await?;
        let new = threading::plan_comment(actor, &post, content).inspect_err(|_| {
            warn!(post_id = %post.id, status = %post.status, "comment on inactive post rejected");
        })?;
        let comment = self.repos.comments.insert(new).await?;
        info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created, pending moderation");
        self.repos.comment_view(comment).await
    }

    /// Reply to an existing comment; a missing parent is `NotFound`.
    #[instrument(skip(self, input), fields(user_id = %actor.user_id))]
    pub async fn reply(&self, actor: &Actor, parent_id: CommentId, input: CreateComment) -> Result<CommentView> {
        let parent = self.load(parent_id).await?;
        let (content, _) = input.validate()?;
        self.reply_to(actor, parent, content).await
    }

    async fn reply_to(&self, actor: &Actor, parent: Comment, content: String) -> Result<CommentView> {
        let post = self.load_post(parent.post_id).await?;
        let new = threading::plan_reply(actor, &parent, &post, content).inspect_err(|err| {
            warn!(parent_id = %parent.id, post_id = %post.id, %err, "reply rejected");
        })?;
        let reply = self.repos.comments.insert(new).await?;
        info!(comment_id = %reply.id, parent_id = %parent.id, "reply created, pending moderation");
        self.repos.comment_view(reply).await
    }

    #[instrument(skip(self))]
    pub async fn show(&self, id: CommentId) -> Result<CommentView> {
        let comment = self.load(id).await?;
        self.repos.comment_detail(comment).await
    }

    /// Owner-only, whatever the comment's status. Only content changes.
    #[instrument(skip(self, input), fields(user_id = %actor.user_id))]
    pub async fn update(&self, actor: &Actor, id: CommentId, input: UpdateComment) -> Result<CommentView> {
        let comment = self.load(id).await?;
        if let Err(err) = policy::authorize(actor, &comment, Action::Edit) {
            warn!(comment_id = %id, owner_id = %comment.user_id, "comment edit rejected");
            return Err(err);
        }

        let content = input.validate()?;
        let comment = self
            .repos
            .comments
            .update_content(id, content)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Comment, id))?;
        info!(comment_id = %id, "comment updated");
        self.repos.comment_view(comment).await
    }

    /// Owner-only; replies below the comment are deleted with it.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: CommentId) -> Result<()> {
        let comment = self.load(id).await?;
        if let Err(err) = policy::authorize(actor, &comment, Action::Delete) {
            warn!(comment_id = %id, owner_id = %comment.user_id, "comment delete rejected");
            return Err(err);
        }

        if !self.repos.comments.delete(id).await? {
            return Err(DomainError::not_found(Entity::Comment, id));
        }
        info!(comment_id = %id, "comment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn feed(&self, params: CommentFeedParams) -> Result<Page<CommentView>> {
        let (query, page) = params.validate()?;
        self.list(&query, page).await
    }

    /// Active comments of a post, oldest first. An unknown post yields an empty page.
    #[instrument(skip(self))]
    pub async fn of_post(&self, post_id: PostId, page: PageRequest) -> Result<Page<CommentView>> {
        self.list(&CommentQuery::of_post(post_id), page).await
    }

    #[instrument(skip(self))]
    pub async fn replies_of(&self, parent_id: CommentId, page: PageRequest) -> Result<Page<CommentView>> {
        let parent = self.load(parent_id).await?;
        self.list(&CommentQuery::replies_of(parent.id), page).await
    }

    #[instrument(skip(self))]
    pub async fn all_replies(&self, page: PageRequest) -> Result<Page<CommentView>> {
        self.list(&CommentQuery::all_replies(), page).await
    }

    #[instrument(skip(self))]
    pub async fn active_by_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<CommentView>> {
        self.list(&CommentQuery::active_by_user(user_id), page).await
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn mine(&self, actor: &Actor, page: PageRequest) -> Result<Page<CommentView>> {
        self.list(&CommentQuery::owned_by(actor.user_id), page).await
    }

    async fn list(&self, query: &CommentQuery, page: PageRequest) -> Result<Page<CommentView>> {
        let comments = self.repos.comments.list(query, page).await?;
        self.repos.comment_page(comments).await
    }
}
