use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, dto::MessageResponse};

/// Message returned whenever a payload lacks one of its mandatory fields.
pub const MISSING_FIELDS: &str = "Missing required fields";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("{0}")]
    InvalidInput(String),
    /// The request clashes with existing data.
    #[error("{0}")]
    Conflict(String),
    /// Requested resource was not found.
    #[error("{0}")]
    NotFound(String),
    /// A bounded retry loop ran out of attempts.
    #[error("{0}")]
    Exhausted(String),
    /// Unexpected inconsistency between the service and its storage.
    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { field } => {
                ServiceError::Conflict(format!("duplicate value for `{field}`"))
            }
            StorageError::Missing { entity, id } => {
                ServiceError::Internal(format!("{entity} `{id}` vanished during the request"))
            }
            unavailable @ StorageError::Unavailable { .. } => ServiceError::Unavailable(unavailable),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("{0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage failure");
                AppError::ServiceUnavailable("Storage unavailable".into())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("Storage unavailable".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) | ServiceError::Conflict(message) => {
                AppError::BadRequest(message)
            }
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Exhausted(message) | ServiceError::Internal(message) => {
                error!(%message, "internal error");
                AppError::Internal(message)
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let mut messages: Vec<(String, String)> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("Invalid value for `{field}`"));
                    (field.to_string(), message)
                })
            })
            .collect();
        messages.sort();

        let message = messages
            .iter()
            .find(|(_, message)| message == MISSING_FIELDS)
            .or_else(|| messages.first())
            .map(|(_, message)| message.clone())
            .unwrap_or_else(|| format!("validation failed: {err}"));
        AppError::BadRequest(message)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) if err.body_text().contains("missing field") => {
                AppError::BadRequest(MISSING_FIELDS.into())
            }
            JsonRejection::JsonDataError(err) => AppError::BadRequest(err.body_text()),
            JsonRejection::JsonSyntaxError(_) => AppError::BadRequest("Malformed JSON body".into()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let text = rejection.body_text();
        if text.contains("missing field") {
            AppError::BadRequest(MISSING_FIELDS.into())
        } else {
            AppError::BadRequest(text)
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::NotFound(format!("Unknown resource: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(MessageResponse::new(self.to_string()));

        (status, payload).into_response()
    }
}
