use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use domains::{CommentId, PostId, UserId};
use services::input::{CommentFeedParams, CreateComment, PageParams, UpdateComment};

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, CurrentUser, PathId};
use crate::resources::CommentResource;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CommentFeedParams>,
) -> ApiResult<Response> {
    let page = state.comments.feed(params).await?;
    Ok(envelope::page(page.map(CommentResource::from)))
}

pub async fn show(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<Response> {
    let view = state.comments.show(CommentId(id)).await?;
    Ok(envelope::ok(CommentResource::from(view)))
}

/// `POST /api/comments/{id}` where `{id}` names the post.
pub async fn store(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(post_id): PathId,
    ApiJson(input): ApiJson<CreateComment>,
) -> ApiResult<Response> {
    let view = state.comments.create(&current.actor(), PostId(post_id), input).await?;
    Ok(envelope::created(
        "comment created and awaiting moderation",
        CommentResource::from(view),
    ))
}

pub async fn reply(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(parent_id): PathId,
    ApiJson(input): ApiJson<CreateComment>,
) -> ApiResult<Response> {
    let view = state.comments.reply(&current.actor(), CommentId(parent_id), input).await?;
    Ok(envelope::created(
        "reply created and awaiting moderation",
        CommentResource::from(view),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(id): PathId,
    ApiJson(input): ApiJson<UpdateComment>,
) -> ApiResult<Response> {
    let view = state.comments.update(&current.actor(), CommentId(id), input).await?;
    Ok(envelope::respond(
        StatusCode::OK,
        "comment updated successfully",
        CommentResource::from(view),
    ))
}

pub async fn destroy(State(state): State<AppState>, current: CurrentUser, PathId(id): PathId) -> ApiResult<Response> {
    state.comments.delete(&current.actor(), CommentId(id)).await?;
    Ok(envelope::respond(StatusCode::OK, "comment deleted successfully", ()))
}

pub async fn of_post(
    State(state): State<AppState>,
    PathId(post_id): PathId,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.comments.of_post(PostId(post_id), params.request()).await?;
    Ok(envelope::page(page.map(CommentResource::from)))
}

pub async fn replies_of(
    State(state): State<AppState>,
    PathId(parent_id): PathId,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.comments.replies_of(CommentId(parent_id), params.request()).await?;
    Ok(envelope::page(page.map(CommentResource::from)))
}

pub async fn all_replies(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.comments.all_replies(params.request()).await?;
    Ok(envelope::page(page.map(CommentResource::from)))
}

pub async fn active_by_user(
    State(state): State<AppState>,
    PathId(user_id): PathId,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.comments.active_by_user(UserId(user_id), params.request()).await?;
    Ok(envelope::page(page.map(CommentResource::from)))
}

pub async fn mine(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.comments.mine(&current.actor(), params.request()).await?;
    Ok(envelope::page(page.map(CommentResource::from)))
}
