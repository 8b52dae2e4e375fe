use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use domains::{PostId, UserId};
use services::input::{CreatePost, PageParams, PostFeedParams, UpdatePost};

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, CurrentUser, PathId};
use crate::resources::PostResource;
use crate::state::AppState;

pub async fn index(State(state): State<AppState>, ApiQuery(params): ApiQuery<PostFeedParams>) -> ApiResult<Response> {
    let page = state.posts.feed(params).await?;
    Ok(envelope::page(page.map(PostResource::from)))
}

pub async fn show(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<Response> {
    let view = state.posts.show(PostId(id)).await?;
    Ok(envelope::ok(PostResource::from(view)))
}

pub async fn store(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<CreatePost>,
) -> ApiResult<Response> {
    let view = state.posts.create(&current.actor(), input).await?;
    Ok(envelope::created("post created successfully", PostResource::from(view)))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    PathId(id): PathId,
    ApiJson(input): ApiJson<UpdatePost>,
) -> ApiResult<Response> {
    let view = state.posts.update(&current.actor(), PostId(id), input).await?;
    Ok(envelope::respond(
        StatusCode::OK,
        "post updated successfully",
        PostResource::from(view),
    ))
}

pub async fn destroy(State(state): State<AppState>, current: CurrentUser, PathId(id): PathId) -> ApiResult<Response> {
    state.posts.delete(&current.actor(), PostId(id)).await?;
    Ok(envelope::respond(StatusCode::OK, "post deleted successfully", ()))
}

pub async fn active_by_user(
    State(state): State<AppState>,
    PathId(user_id): PathId,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.posts.active_by_user(UserId(user_id), params.request()).await?;
    Ok(envelope::page(page.map(PostResource::from)))
}

pub async fn mine(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Response> {
    let page = state.posts.mine(&current.actor(), params.request()).await?;
    Ok(envelope::page(page.map(PostResource::from)))
}
