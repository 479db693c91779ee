use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use coinbot_application::AppError;

pub const TOKEN_REQUIRED: &str = "Token is required.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const DATA_REQUIRED: &str = "Data is required.";

#[derive(Debug)]
pub enum HttpError {
    TokenRequired,
    InvalidToken,
    BadRequest(String),
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::InvalidToken,
            AppError::BadRequest(msg) | AppError::ConfigInvalid(msg) => HttpError::BadRequest(msg),
            AppError::Slot(err) => HttpError::BadRequest(err.to_string()),
            other => HttpError::Internal(other.to_string()),
        }
    }
}

/// Every response body from the config endpoints has this shape.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::TokenRequired => (StatusCode::UNAUTHORIZED, TOKEN_REQUIRED.to_string()),
            HttpError::InvalidToken => (StatusCode::UNAUTHORIZED, INVALID_TOKEN.to_string()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Internal(msg) => {
                error!("request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        if status == StatusCode::UNAUTHORIZED {
            warn!("rejected request: {}", message);
        }
        (status, MessageBody::new(message)).into_response()
    }
}
