use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::IngestError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NO_FILE_PROVIDED`,
    /// `INVALID_CSV`, `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`,
    /// `NOT_FOUND`, `USERNAME_TAKEN`, `STORAGE_MISSING`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_CSV")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid CSV format: No columns to parse from file")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// The upload request carried no `file` field.
    NoFileProvided,
    /// The uploaded file is not readable tabular data.
    InvalidCsv(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// Missing, or owned by someone else.
    NotFound(String),
    UsernameTaken,
    /// A history record outlived its backing file.
    StorageMissing(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NoFileProvided => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "NO_FILE_PROVIDED",
                    message: "No file provided".into(),
                },
            ),
            AppError::InvalidCsv(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_CSV",
                    message: format!("Invalid CSV format: {msg}"),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid Credentials".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::StorageMissing(file_name) => {
                tracing::error!(file_name = %file_name, "Backing file missing for history record");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_MISSING",
                        message: "The file for this upload is no longer available".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::InvalidCsv(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::StorageMissing(name),
            too_big @ StorageError::SizeLimitExceeded { .. } => {
                AppError::Validation(too_big.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
