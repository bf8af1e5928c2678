// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Already deleted: {0}")]
    AlreadyDeleted(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Failed to parse UUID: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::DbErr(db_err) => {
                tracing::error!(error = ?db_err, "Database error");

                // 接続断などの一時障害は503、それ以外は500
                let status = match db_err {
                    DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
                    DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                let (message, details) = match &db_err {
                    DbErr::RecordNotFound(entity) => (
                        "The requested resource was not found".to_string(),
                        Some(json!({ "entity": entity })),
                    ),
                    DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => (
                        "The data store is temporarily unavailable".to_string(),
                        Some(json!({ "retryable": true })),
                    ),
                    DbErr::Exec(_) => (
                        "A database operation failed".to_string(),
                        Some(json!({ "operation": "exec" })),
                    ),
                    DbErr::Query(_) => (
                        "A database query failed".to_string(),
                        Some(json!({ "operation": "query" })),
                    ),
                    _ => ("A database error occurred".to_string(), None),
                };

                (
                    status,
                    ErrorResponse {
                        success: false,
                        error: message.clone(),
                        message,
                        details,
                        validation_errors: None,
                        error_type: "store_unavailable".to_string(),
                    },
                )
            }
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::simple(message, "not_found"),
            ),
            AppError::AlreadyDeleted(message) => (
                StatusCode::CONFLICT,
                ErrorResponse::simple(message, "already_deleted"),
            ),
            AppError::InvalidState(message) => (
                StatusCode::CONFLICT,
                ErrorResponse::simple(message, "invalid_state"),
            ),
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::simple(message, "validation_error"),
            ),
            AppError::UuidError(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::simple(format!("Invalid UUID: {}", err), "invalid_uuid"),
            ),
            AppError::ValidationFailure(errors) => {
                let field_errors: HashMap<String, Vec<String>> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let messages = errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map_or_else(|| "Invalid value".to_string(), |m| m.to_string())
                            })
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        success: false,
                        error: "Validation failed".to_string(),
                        message: "Validation failed".to_string(),
                        details: None,
                        validation_errors: Some(field_errors),
                        error_type: "validation_errors".to_string(),
                    },
                )
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::simple(message, "bad_request"),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::simple(message, "unauthorized"),
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::simple(message, "forbidden"),
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorResponse::simple(message, "conflict"),
            ),
            AppError::InternalServerError(message) => {
                tracing::error!(message = %message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::simple(
                        "An internal server error occurred".to_string(),
                        "internal_server_error",
                    ),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, Vec<String>>>,
    pub error_type: String,
}

impl ErrorResponse {
    fn simple(message: impl Into<String>, error_type: &str) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: message.clone(),
            message,
            details: None,
            validation_errors: None,
            error_type: error_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_outcomes_map_to_conflict_status() {
        // AlreadyDeleted / InvalidState / Conflict は障害ではなく業務上の結果
        for err in [
            AppError::AlreadyDeleted("user".to_string()),
            AppError::InvalidState("request is not pending".to_string()),
            AppError::Conflict("pending request exists".to_string()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn transient_store_faults_are_service_unavailable() {
        let err = AppError::DbErr(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "connection refused".to_string(),
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
