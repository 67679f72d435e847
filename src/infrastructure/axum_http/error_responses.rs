use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

pub fn render(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });

    (status, body).into_response()
}

/// Server errors render a generic message; the detail stays in the logs.
pub fn render_error(status: StatusCode, err: &dyn std::fmt::Display) -> Response {
    if status.is_server_error() {
        render(status, "Internal server error")
    } else {
        render(status, err.to_string())
    }
}
