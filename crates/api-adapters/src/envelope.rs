//! Success envelopes: `{message, success, data}` and paginated `{data, meta}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use domains::Page;

pub const DEFAULT_MESSAGE: &str = "operation completed successfully";

#[derive(Serialize)]
struct Envelope<'a, T> {
    message: &'a str,
    success: bool,
    data: T,
}

pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let body = Envelope {
        message,
        success: true,
        data,
    };
    (status, Json(body)).into_response()
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, DEFAULT_MESSAGE, data)
}

pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    respond(StatusCode::CREATED, message, data)
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[derive(Serialize)]
struct Listing<T> {
    data: Vec<T>,
    meta: PageMeta,
}

pub fn page<T: Serialize>(page: Page<T>) -> Response {
    let meta = PageMeta {
        current_page: page.page,
        last_page: page.last_page(),
        per_page: page.per_page,
        total: page.total,
    };
    Json(Listing { data: page.items, meta }).into_response()
}
