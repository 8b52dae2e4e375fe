//! # DomainError
//!
//! Centralized error taxonomy for the blog core.
//! Every service and adapter reports failures through this type; the HTTP
//! layer maps each variant to exactly one status code.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    User,
    Post,
    Comment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Post => "post",
            Entity::Comment => "comment",
        })
    }
}

/// Why an ownership or lifecycle gate rejected an operation.
///
/// Each reason renders a distinct, stable message so callers can tell
/// "editing" from "deleting" and parent-inactive from post-inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    EditPost,
    DeletePost,
    EditComment,
    DeleteComment,
    CommentOnInactivePost,
    ReplyToInactiveComment,
    ReplyOnInactivePost,
}

impl ForbiddenReason {
    pub fn message(self) -> &'static str {
        match self {
            ForbiddenReason::EditPost => "insufficient permissions to edit this post",
            ForbiddenReason::DeletePost => "insufficient permissions to delete this post",
            ForbiddenReason::EditComment => "insufficient permissions to edit this comment",
            ForbiddenReason::DeleteComment => "insufficient permissions to delete this comment",
            ForbiddenReason::CommentOnInactivePost => "cannot comment on inactive post",
            ForbiddenReason::ReplyToInactiveComment => "cannot reply to inactive comment",
            ForbiddenReason::ReplyOnInactivePost => "cannot reply to comments on inactive post",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Field-by-field validation failures, keyed by input field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a single failing field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or missing input, reported per field.
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    /// Ownership or lifecycle gate failed.
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),

    /// Referenced entity does not exist.
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: Entity, id: i64 },

    /// Missing, invalid, expired or revoked credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Uniqueness constraint violated (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure in a store or auth adapter.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: Entity, id: impl Into<i64>) -> Self {
        DomainError::NotFound { entity, id: id.into() }
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        DomainError::Storage(err.to_string())
    }
}

/// A specialized Result type for blog core logic.
pub type Result<T> = std::result::Result<T, DomainError>;
