//! Maps `DomainError` onto HTTP statuses and the failure envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use domains::{DomainError, ValidationErrors};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// No route, or a path segment that cannot name a resource.
    RouteNotFound,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ApiError::Domain(DomainError::Validation(ValidationErrors::single(field, message)))
    }

    fn parts(self) -> (StatusCode, String, Value) {
        let err = match self {
            ApiError::RouteNotFound => return (StatusCode::NOT_FOUND, "resource not found".into(), Value::Null),
            ApiError::Domain(err) => err,
        };
        match err {
            DomainError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation failed".into(),
                json!(errors),
            ),
            DomainError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.message().into(), Value::Null),
            DomainError::NotFound { entity, .. } => (StatusCode::NOT_FOUND, format!("{entity} not found"), Value::Null),
            DomainError::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, message, Value::Null),
            DomainError::Conflict(message) => (StatusCode::CONFLICT, message, Value::Null),
            DomainError::Storage(detail) => {
                error!(%detail, "request failed on a storage fault");
                (StatusCode::INTERNAL_SERVER_ERROR, "server error".into(), Value::Null)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.parts();
        let body = json!({
            "message": message,
            "success": false,
            "errors": errors,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Entity, ForbiddenReason};

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn every_variant_has_one_status() {
        assert_eq!(
            status_of(DomainError::Validation(ValidationErrors::single("title", "title is required"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::Forbidden(ForbiddenReason::EditPost)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(DomainError::not_found(Entity::Post, 1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(DomainError::Unauthenticated("no".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(DomainError::Conflict("dup".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(DomainError::storage("connection reset")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_detail_stays_out_of_the_body() {
        let (_, message, errors) = ApiError::from(DomainError::storage("password=hunter2")).parts();
        assert_eq!(message, "server error");
        assert!(errors.is_null());
    }

    #[test]
    fn forbidden_carries_its_reason() {
        let (_, message, _) = ApiError::from(DomainError::Forbidden(ForbiddenReason::CommentOnInactivePost)).parts();
        assert_eq!(message, "cannot comment on inactive post");
    }
}
