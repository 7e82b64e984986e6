//! Typed errors and HTTP mapping.

use crate::response::failure_headers;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Why a request's identifier was rejected. Serialized as `errorKey` in error details.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdErrorKey {
    /// POST body carried an id.
    Exists,
    /// PUT/PATCH body had no id.
    Null,
    /// Path and body ids differ.
    Invalid,
    /// PUT/PATCH id was never persisted.
    NotFound,
}

impl IdErrorKey {
    pub fn as_str(self) -> &'static str {
        match self {
            IdErrorKey::Exists => "idexists",
            IdErrorKey::Null => "idnull",
            IdErrorKey::Invalid => "idinvalid",
            IdErrorKey::NotFound => "idnotfound",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("{message}")]
    Identifier {
        entity: &'static str,
        key: IdErrorKey,
        message: String,
    },
}

impl AppError {
    pub fn id_exists(entity: &'static str) -> Self {
        AppError::Identifier {
            entity,
            key: IdErrorKey::Exists,
            message: format!("A new {} cannot already have an ID", entity),
        }
    }

    pub fn id_null(entity: &'static str) -> Self {
        AppError::Identifier {
            entity,
            key: IdErrorKey::Null,
            message: "Invalid id".into(),
        }
    }

    pub fn id_invalid(entity: &'static str) -> Self {
        AppError::Identifier {
            entity,
            key: IdErrorKey::Invalid,
            message: "Invalid ID".into(),
        }
    }

    pub fn id_not_found(entity: &'static str) -> Self {
        AppError::Identifier {
            entity,
            key: IdErrorKey::NotFound,
            message: "Entity not found".into(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Identifier { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let (details, headers) = match &self {
            AppError::Identifier { entity, key, .. } => (
                Some(serde_json::json!({ "entityName": entity, "errorKey": key.as_str() })),
                failure_headers(entity, key.as_str()),
            ),
            _ => (None, Default::default()),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, headers, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_errors_are_bad_requests_with_headers() {
        let response = AppError::id_exists("resident").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-residenceapp-error"], "error.idexists");
        assert_eq!(response.headers()["x-residenceapp-params"], "resident");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::NotFound("x".into()).into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Validation("x".into()).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Db(sqlx::Error::PoolClosed).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Db(sqlx::Error::RowNotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
