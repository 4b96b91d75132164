use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt::Display;

use crate::jobs::JobLifecycleError;
use crate::pages::ErrorPage;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "you do not have access to this page")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "page not found")
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let message = if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.message, "request failed");
            "internal server error".to_string()
        } else {
            self.message
        };

        let page = ErrorPage {
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            username: String::new(),
            status: status.as_u16(),
            message,
        };
        let body = page
            .render()
            .unwrap_or_else(|_| format!("{} {}", page.status, page.message));
        (status, Html(body)).into_response()
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<JobLifecycleError> for AppError {
    fn from(value: JobLifecycleError) -> Self {
        match value {
            JobLifecycleError::AlreadyExpired(_) => AppError::bad_request(value.to_string()),
            JobLifecycleError::Database(err) => AppError::from(err),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(value: askama::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}
