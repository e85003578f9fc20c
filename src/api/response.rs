use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub status: String,
    pub status_code: u16,
    pub timestamp: String,
    pub message: Option<String>,
}

impl ResponseMeta {
    fn new(status: StatusCode, message: Option<String>) -> Self {
        let label = if status.is_success() { "success" } else { "error" };
        Self {
            status: label.to_string(),
            status_code: status.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
            message,
        }
    }
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: Some(data),
            meta: ResponseMeta::new(StatusCode::OK, None),
        }),
    )
}

pub fn error<T>(status: StatusCode, message: String) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        status,
        Json(ApiResponse {
            data: None,
            meta: ResponseMeta::new(status, Some(message)),
        }),
    )
}

/// Render a handler outcome as the standard envelope.
pub fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(data) => success(data).into_response(),
        Err(err) => err.into_response(),
    }
}
