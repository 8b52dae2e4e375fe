//! # Ownership Policy
//!
//! Decides whether an actor may mutate an entity. The only rule is
//! `actor.user_id == entity owner`; there is no role-based override.

use crate::error::{DomainError, ForbiddenReason, Result};
use crate::models::{Comment, Post, User, UserId};

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self { user_id: user.id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
}

/// Anything with an immutable owner that the policy can gate.
pub trait Owned {
    fn owner_id(&self) -> UserId;

    /// Reason reported when `action` is denied on this kind of entity.
    fn denied(action: Action) -> ForbiddenReason;
}

impl Owned for Post {
    fn owner_id(&self) -> UserId {
        self.user_id
    }

    fn denied(action: Action) -> ForbiddenReason {
        match action {
            Action::Edit => ForbiddenReason::EditPost,
            Action::Delete => ForbiddenReason::DeletePost,
        }
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> UserId {
        self.user_id
    }

    fn denied(action: Action) -> ForbiddenReason {
        match action {
            Action::Edit => ForbiddenReason::EditComment,
            Action::Delete => ForbiddenReason::DeleteComment,
        }
    }
}

pub fn can_mutate<E: Owned>(actor: &Actor, entity: &E) -> bool {
    actor.user_id == entity.owner_id()
}

/// Gate an update or delete.
///
/// Denial is always `Forbidden`, never `NotFound`: callers have already
/// resolved the entity, so existence is not hidden.
pub fn authorize<E: Owned>(actor: &Actor, entity: &E, action: Action) -> Result<()> {
    if can_mutate(actor, entity) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(E::denied(action)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentId, CommentStatus, PostId, PostStatus};
    use chrono::Utc;

    fn post_by(owner: i64) -> Post {
        Post {
            id: PostId(10),
            title: "t".into(),
            content: "c".into(),
            status: PostStatus::Published,
            user_id: UserId(owner),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment_by(owner: i64, status: CommentStatus) -> Comment {
        Comment {
            id: CommentId(20),
            content: "c".into(),
            status,
            user_id: UserId(owner),
            post_id: PostId(10),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_may_edit_and_delete() {
        let actor = Actor::new(UserId(1));
        assert!(authorize(&actor, &post_by(1), Action::Edit).is_ok());
        assert!(authorize(&actor, &post_by(1), Action::Delete).is_ok());
    }

    #[test]
    fn stranger_gets_action_specific_reason() {
        let actor = Actor::new(UserId(2));
        let edit = authorize(&actor, &post_by(1), Action::Edit).unwrap_err();
        let delete = authorize(&actor, &post_by(1), Action::Delete).unwrap_err();
        assert!(matches!(edit, DomainError::Forbidden(ForbiddenReason::EditPost)));
        assert!(matches!(delete, DomainError::Forbidden(ForbiddenReason::DeletePost)));
    }

    #[test]
    fn comment_ownership_ignores_status() {
        let owner = Actor::new(UserId(3));
        let stranger = Actor::new(UserId(4));
        for status in CommentStatus::ALL {
            let comment = comment_by(3, status);
            assert!(authorize(&owner, &comment, Action::Edit).is_ok());
            assert!(matches!(
                authorize(&stranger, &comment, Action::Delete),
                Err(DomainError::Forbidden(ForbiddenReason::DeleteComment))
            ));
        }
    }
}
