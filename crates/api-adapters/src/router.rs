use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{auth, comments, posts};
use crate::metrics::{scrape, track_requests};
use crate::state::AppState;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Every route of the service. Path parameters share the name `{id}` so
/// sibling routes can coexist in the matcher.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Posts
        .route("/api/posts", get(posts::index).post(posts::store))
        .route(
            "/api/posts/{id}",
            get(posts::show).put(posts::update).delete(posts::destroy),
        )
        .route("/api/posts/{id}/comments", get(comments::of_post))
        .route("/api/my/posts", get(posts::mine))
        .route("/api/users/{id}/posts/active", get(posts::active_by_user))
        // Comments
        .route("/api/comments", get(comments::index))
        .route("/api/comments/replies", get(comments::all_replies))
        .route(
            "/api/comments/{id}",
            get(comments::show)
                .post(comments::store)
                .put(comments::update)
                .delete(comments::destroy),
        )
        .route("/api/comments/{id}/reply", post(comments::reply))
        .route("/api/comments/{id}/replies", get(comments::replies_of))
        .route("/api/my/comments", get(comments::mine))
        .route("/api/users/{id}/comments/active", get(comments::active_by_user))
        // Ops
        .route("/up", get(|| async { "OK" }))
        .route("/metrics", get(scrape))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .fallback(|| async { ApiError::RouteNotFound })
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(&REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
