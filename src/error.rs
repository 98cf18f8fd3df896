use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use slaq_core::SlaqError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Query(#[from] SlaqError),

    #[error("Log file not found: {0}")]
    LogFileNotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Query(SlaqError::LexError { .. } | SlaqError::ParseError { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Query(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LogFileNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::IoError(_) | AppError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
