//! Raw request inputs and their field-by-field validation.
//!
//! Every field is optional at the type level so that a missing field is
//! reported alongside all other failures instead of aborting deserialization.

use serde::Deserialize;

use domains::{
    CommentId, CommentQuery, CommentStatus, NewPost, PageRequest, PostChanges, PostId, PostQuery, PostStatus,
    Result, UserId, ValidationErrors,
};

pub const TITLE_MAX: usize = 255;
pub const COMMENT_MAX: usize = 1000;
pub const NAME_MAX: usize = 255;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 8;

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(errors: &mut ValidationErrors, field: &str, value: Option<String>, label: &str) -> Option<String> {
    let value = present(value);
    if value.is_none() {
        errors.add(field, format!("{label} is required"));
    }
    value
}

fn max_chars(errors: &mut ValidationErrors, field: &str, value: &Option<String>, max: usize, label: &str) {
    if value.as_ref().is_some_and(|v| v.chars().count() > max) {
        errors.add(field, format!("{label} must not exceed {max} characters"));
    }
}

fn post_status(errors: &mut ValidationErrors, value: Option<String>) -> Option<PostStatus> {
    let raw = present(value)?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.add("status", "invalid post status");
            None
        }
    }
}

fn comment_status(errors: &mut ValidationErrors, value: Option<String>) -> Option<CommentStatus> {
    let raw = present(value)?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.add("status", "invalid comment status");
            None
        }
    }
}

/// Query-string flags accept the usual truthy spellings.
fn truthy(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1" | "true" | "on" | "yes"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

impl CreatePost {
    pub fn validate(self, owner: UserId) -> Result<NewPost> {
        let mut errors = ValidationErrors::new();
        let title = required(&mut errors, "title", self.title, "title");
        max_chars(&mut errors, "title", &title, TITLE_MAX, "title");
        let content = required(&mut errors, "content", self.content, "post content");
        let status = post_status(&mut errors, self.status);
        errors.into_result()?;

        Ok(NewPost {
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
            status: status.unwrap_or_default(),
            user_id: owner,
        })
    }
}

/// Partial update; only present fields are validated and applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

impl UpdatePost {
    pub fn validate(self) -> Result<PostChanges> {
        let mut errors = ValidationErrors::new();
        let title = self.title.and_then(|t| required(&mut errors, "title", Some(t), "title"));
        max_chars(&mut errors, "title", &title, TITLE_MAX, "title");
        let content = self
            .content
            .and_then(|c| required(&mut errors, "content", Some(c), "post content"));
        let status = post_status(&mut errors, self.status);
        errors.into_result()?;

        Ok(PostChanges { title, content, status })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateComment {
    pub content: Option<String>,
    /// When set, the comment is created as a reply to this comment.
    pub parent_id: Option<i64>,
}

impl CreateComment {
    pub fn validate(self) -> Result<(String, Option<CommentId>)> {
        let content = comment_content(self.content)?;
        Ok((content, self.parent_id.map(CommentId)))
    }
}

/// Only `content` is editable; any other field in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub content: Option<String>,
}

impl UpdateComment {
    pub fn validate(self) -> Result<String> {
        comment_content(self.content)
    }
}

fn comment_content(value: Option<String>) -> Result<String> {
    let mut errors = ValidationErrors::new();
    let content = required(&mut errors, "content", value, "comment content");
    max_chars(&mut errors, "content", &content, COMMENT_MAX, "comment content");
    errors.into_result()?;
    Ok(content.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Register {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration data; the password is still plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Register {
    pub fn validate(self) -> Result<Registration> {
        let mut errors = ValidationErrors::new();

        let name = required(&mut errors, "name", self.name, "name");
        max_chars(&mut errors, "name", &name, NAME_MAX, "name");

        let email = required(&mut errors, "email", self.email, "email").map(|e| e.to_lowercase());
        max_chars(&mut errors, "email", &email, EMAIL_MAX, "email");
        if email.as_deref().is_some_and(|e| !looks_like_email(e)) {
            errors.add("email", "email must be a valid email address");
        }

        // Passwords are not trimmed.
        let password = self.password.filter(|p| !p.is_empty());
        match &password {
            None => errors.add("password", "password is required"),
            Some(p) if p.chars().count() < PASSWORD_MIN => {
                errors.add("password", format!("password must be at least {PASSWORD_MIN} characters"))
            }
            Some(_) => {}
        }
        errors.into_result()?;

        Ok(Registration {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Login {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Login {
    pub fn validate(self) -> Result<(String, String)> {
        let mut errors = ValidationErrors::new();
        let email = required(&mut errors, "email", self.email, "email").map(|e| e.to_lowercase());
        let password = self.password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.add("password", "password is required");
        }
        errors.into_result()?;
        Ok((email.unwrap_or_default(), password.unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFeedParams {
    pub status: Option<String>,
    pub user_id: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl PostFeedParams {
    pub fn validate(self) -> Result<(PostQuery, PageRequest)> {
        let mut errors = ValidationErrors::new();
        let status = post_status(&mut errors, self.status);
        errors.into_result()?;

        let query = PostQuery::feed(status, self.user_id.map(UserId), present(self.search));
        Ok((query, PageRequest::new(self.page.unwrap_or(1))))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFeedParams {
    pub status: Option<String>,
    pub user_id: Option<i64>,
    pub post_id: Option<i64>,
    pub replies_only: Option<String>,
    pub page: Option<u32>,
}

impl CommentFeedParams {
    pub fn validate(self) -> Result<(CommentQuery, PageRequest)> {
        let mut errors = ValidationErrors::new();
        let status = comment_status(&mut errors, self.status);
        errors.into_result()?;

        let query = CommentQuery::feed(
            status,
            self.user_id.map(UserId),
            self.post_id.map(PostId),
            truthy(self.replies_only.as_deref()),
        );
        Ok((query, PageRequest::new(self.page.unwrap_or(1))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::DomainError;

    fn errors_of<T: std::fmt::Debug>(result: Result<T>) -> ValidationErrors {
        match result {
            Err(DomainError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_post_defaults_to_draft() {
        let new = CreatePost {
            title: Some(" Title ".into()),
            content: Some("Body".into()),
            status: None,
        }
        .validate(UserId(3))
        .unwrap();
        assert_eq!(new.title, "Title");
        assert_eq!(new.status, PostStatus::Draft);
        assert_eq!(new.user_id, UserId(3));
    }

    #[test]
    fn create_post_reports_every_field() {
        let errors = errors_of(
            CreatePost {
                title: Some("x".repeat(256)),
                content: Some("   ".into()),
                status: Some("live".into()),
            }
            .validate(UserId(1)),
        );
        assert_eq!(errors.messages("title"), ["title must not exceed 255 characters"]);
        assert_eq!(errors.messages("content"), ["post content is required"]);
        assert_eq!(errors.messages("status"), ["invalid post status"]);
    }

    #[test]
    fn update_post_keeps_absent_fields_untouched() {
        let changes = UpdatePost {
            status: Some("archived".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.status, Some(PostStatus::Archived));
    }

    #[test]
    fn update_post_rejects_blank_title() {
        let errors = errors_of(
            UpdatePost {
                title: Some("".into()),
                ..Default::default()
            }
            .validate(),
        );
        assert!(errors.contains("title"));
    }

    #[test]
    fn comment_content_is_required_and_bounded() {
        assert!(errors_of(CreateComment::default().validate()).contains("content"));

        let errors = errors_of(
            UpdateComment {
                content: Some("x".repeat(COMMENT_MAX + 1)),
            }
            .validate(),
        );
        assert_eq!(errors.messages("content"), ["comment content must not exceed 1000 characters"]);

        let (content, parent) = CreateComment {
            content: Some("ok".into()),
            parent_id: Some(4),
        }
        .validate()
        .unwrap();
        assert_eq!(content, "ok");
        assert_eq!(parent, Some(CommentId(4)));
    }

    #[test]
    fn register_validates_email_and_password() {
        let errors = errors_of(
            Register {
                name: None,
                email: Some("not-an-email".into()),
                password: Some("short".into()),
            }
            .validate(),
        );
        assert!(errors.contains("name"));
        assert!(errors.contains("email"));
        assert_eq!(errors.messages("password"), ["password must be at least 8 characters"]);

        let ok = Register {
            name: Some("Ann".into()),
            email: Some("Ann@Example.com".into()),
            password: Some("password123".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.email, "ann@example.com");
    }

    #[test]
    fn comment_feed_parses_replies_only_flag() {
        let (query, page) = CommentFeedParams {
            replies_only: Some("1".into()),
            page: Some(3),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(query.replies_only);
        assert_eq!(page.page(), 3);

        let (query, _) = CommentFeedParams {
            replies_only: Some("0".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(!query.replies_only);
    }

    #[test]
    fn feed_rejects_unknown_status() {
        let errors = errors_of(
            PostFeedParams {
                status: Some("hidden".into()),
                ..Default::default()
            }
            .validate(),
        );
        assert!(errors.contains("status"));
    }
}
