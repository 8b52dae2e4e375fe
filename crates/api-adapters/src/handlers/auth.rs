use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use services::input::{Login, Register};
use services::Session;

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser};
use crate::resources::UserResource;
use crate::state::AppState;

#[derive(Serialize)]
struct AuthBody {
    message: &'static str,
    success: bool,
    user: UserResource,
    token: String,
}

fn session(status: StatusCode, message: &'static str, session: Session) -> Response {
    let body = AuthBody {
        message,
        success: true,
        user: session.user.into(),
        token: session.token.token,
    };
    (status, Json(body)).into_response()
}

pub async fn register(State(state): State<AppState>, ApiJson(input): ApiJson<Register>) -> ApiResult<Response> {
    let created = state.auth.register(input).await?;
    Ok(session(StatusCode::CREATED, "user registered successfully", created))
}

pub async fn login(State(state): State<AppState>, ApiJson(input): ApiJson<Login>) -> ApiResult<Response> {
    let opened = state.auth.login(input).await?;
    Ok(session(StatusCode::OK, "user logged in successfully", opened))
}

pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> ApiResult<Response> {
    state.auth.logout(&current.claims).await?;
    Ok(envelope::respond(StatusCode::OK, "logged out successfully", ()))
}

pub async fn me(current: CurrentUser) -> Response {
    envelope::ok(UserResource::from(current.user))
}
