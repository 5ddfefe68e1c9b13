//! Errores de la API y su respuesta JSON `{success: false, error}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// `duplicate_exists` se expone al cliente cuando el conflicto viene de
    /// un archivo ya subido con el mismo nombre.
    #[error("{message}")]
    Conflict { message: String, duplicate_exists: bool },

    /// El primer campo se devuelve al cliente, el segundo solo se registra.
    #[error("{0}")]
    Internal(String, String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict { message: msg.into(), duplicate_exists: false }
    }

    /// Error interno con mensaje público y detalle para el log.
    pub fn internal(public: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        ApiError::Internal(public.into(), detail.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(public, detail) = self {
            error!("{public}: {detail}");
        }

        let body = match self {
            ApiError::Conflict { message, duplicate_exists: true } => {
                json!({"success": false, "error": message, "duplicateExists": true})
            }
            other => json!({"success": false, "error": other.to_string()}),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::internal("Database error", e)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::internal("Storage error", e)
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        ApiError::internal("Password hashing failed", e)
    }
}

impl From<actix_session::SessionInsertError> for ApiError {
    fn from(e: actix_session::SessionInsertError) -> Self {
        ApiError::internal("Session error", e)
    }
}

impl From<actix_session::SessionGetError> for ApiError {
    fn from(e: actix_session::SessionGetError) -> Self {
        ApiError::internal("Session error", e)
    }
}
