//! Post use cases: authoring, editing, deleting and the post read views.

use tracing::{info, instrument, warn};

use domains::policy::{self, Action};
use domains::{Actor, DomainError, Entity, Page, PageRequest, Post, PostId, PostQuery, Result, UserId};

use crate::input::{CreatePost, PostFeedParams, UpdatePost};
use crate::views::{PostView, Repositories};

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn load(&self, id: PostId) -> Result<Post> {
        self.repos
            .posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Post, id))
    }

    #[instrument(skip(self, input), fields(user_id = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, input: CreatePost) -> Result<PostView> {
        let new = input.validate(actor.user_id)?;
        let post = self.repos.posts.insert(new).await?;
        info!(post_id = %post.id, status = %post.status, "post created");
        self.repos.post_detail(post).await
    }

    #[instrument(skip(self))]
    pub async fn show(&self, id: PostId) -> Result<PostView> {
        let post = self.load(id).await?;
        self.repos.post_detail(post).await
    }

    /// Owner-only; any status may be set, there is no transition graph.
    #[instrument(skip(self, input), fields(user_id = %actor.user_id))]
    pub async fn update(&self, actor: &Actor, id: PostId, input: UpdatePost) -> Result<PostView> {
        let post = self.load(id).await?;
        if let Err(err) = policy::authorize(actor, &post, Action::Edit) {
            warn!(post_id = %id, owner_id = %post.user_id, "post edit rejected");
            return Err(err);
        }

        let changes = input.validate()?;
        let post = if changes.is_empty() {
            post
        } else {
            self.repos
                .posts
                .update(id, changes)
                .await?
                .ok_or_else(|| DomainError::not_found(Entity::Post, id))?
        };
        info!(post_id = %id, status = %post.status, "post updated");
        self.repos.post_detail(post).await
    }

    /// Owner-only; takes every comment of the post with it.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: PostId) -> Result<()> {
        let post = self.load(id).await?;
        if let Err(err) = policy::authorize(actor, &post, Action::Delete) {
            warn!(post_id = %id, owner_id = %post.user_id, "post delete rejected");
            return Err(err);
        }

        if !self.repos.posts.delete(id).await? {
            return Err(DomainError::not_found(Entity::Post, id));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Public feed: optional status, author and search filters, newest first.
    #[instrument(skip(self))]
    pub async fn feed(&self, params: PostFeedParams) -> Result<Page<PostView>> {
        let (query, page) = params.validate()?;
        self.list(&query, page).await
    }

    #[instrument(skip(self))]
    pub async fn active_by_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<PostView>> {
        self.list(&PostQuery::active_by_user(user_id), page).await
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn mine(&self, actor: &Actor, page: PageRequest) -> Result<Page<PostView>> {
        self.list(&PostQuery::owned_by(actor.user_id), page).await
    }

    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<PostView>> {
        let posts = self.repos.posts.list(query, page).await?;
        self.repos.post_page(posts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use domains::{
        ForbiddenReason, MockCommentRepository, MockPostRepository, MockUserRepository, PostChanges, PostStatus,
    };
    use mockall::predicate::eq;

    fn post(id: i64, owner: i64, status: PostStatus) -> Post {
        Post {
            id: PostId(id),
            title: "Original Title".into(),
            content: "Original content".into(),
            status,
            user_id: UserId(owner),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Repositories whose related-record lookups always come back empty.
    fn repos(posts: MockPostRepository) -> Repositories {
        let mut users = MockUserRepository::new();
        users.expect_find_many().returning(|_| Ok(vec![]));
        let mut comments = MockCommentRepository::new();
        comments.expect_for_post().returning(|_| Ok(vec![]));
        Repositories {
            users: Arc::new(users),
            posts: Arc::new(posts),
            comments: Arc::new(comments),
        }
    }

    #[tokio::test]
    async fn create_defaults_to_draft_owned_by_actor() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_insert()
            .withf(|new| new.status == PostStatus::Draft && new.user_id == UserId(1))
            .times(1)
            .returning(|new| {
                let mut p = post(7, new.user_id.0, new.status);
                p.title = new.title;
                Ok(p)
            });

        let service = PostService::new(repos(posts));
        let view = service
            .create(
                &Actor::new(UserId(1)),
                CreatePost {
                    title: Some("Test Post".into()),
                    content: Some("Body".into()),
                    status: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(view.post.status, PostStatus::Draft);
        assert_eq!(view.post.title, "Test Post");
        assert_eq!(view.comments.map(|c| c.len()), Some(0));
    }

    #[tokio::test]
    async fn invalid_create_never_touches_the_store() {
        let mut posts = MockPostRepository::new();
        posts.expect_insert().never();

        let service = PostService::new(repos(posts));
        let err = service
            .create(&Actor::new(UserId(1)), CreatePost::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref e) if e.contains("title") && e.contains("content")));
    }

    #[tokio::test]
    async fn stranger_cannot_update_and_store_is_untouched() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find()
            .with(eq(PostId(3)))
            .returning(|_| Ok(Some(post(3, 1, PostStatus::Published))));
        posts.expect_update().never();

        let service = PostService::new(repos(posts));
        let err = service
            .update(
                &Actor::new(UserId(2)),
                PostId(3),
                UpdatePost {
                    title: Some("Hacked Title".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(ForbiddenReason::EditPost)));
    }

    #[tokio::test]
    async fn owner_may_move_post_to_any_status() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find()
            .returning(|_| Ok(Some(post(3, 1, PostStatus::Published))));
        posts
            .expect_update()
            .with(
                eq(PostId(3)),
                eq(PostChanges {
                    status: Some(PostStatus::Draft),
                    ..Default::default()
                }),
            )
            .times(1)
            .returning(|_, _| Ok(Some(post(3, 1, PostStatus::Draft))));

        let service = PostService::new(repos(posts));
        let view = service
            .update(
                &Actor::new(UserId(1)),
                PostId(3),
                UpdatePost {
                    status: Some("draft".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.post.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn stranger_cannot_delete() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find()
            .returning(|_| Ok(Some(post(3, 1, PostStatus::Draft))));
        posts.expect_delete().never();

        let service = PostService::new(repos(posts));
        let err = service.delete(&Actor::new(UserId(9)), PostId(3)).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(ForbiddenReason::DeletePost)));
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts.expect_find().returning(|_| Ok(None));

        let service = PostService::new(repos(posts));
        let err = service.delete(&Actor::new(UserId(1)), PostId(404)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: Entity::Post, id: 404 }));
    }

    #[tokio::test]
    async fn active_by_user_queries_published_posts_of_that_user() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_list()
            .withf(|query, page| *query == PostQuery::active_by_user(UserId(5)) && page.page() == 2)
            .times(1)
            .returning(|_, page| Ok(Page::new(vec![], page, 0)));

        let service = PostService::new(repos(posts));
        let page = service.active_by_user(UserId(5), PageRequest::new(2)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page, 2);
    }
}
