use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::{metadata::MetadataError, storage::StorageError},
    state::{ApplyError, PlanError, state_machine::RoundPhase},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation requires another lifecycle phase.
    #[error("operation requires the {expected:?} phase but the game is in {actual:?}")]
    PhaseMismatch {
        expected: RoundPhase,
        actual: RoundPhase,
    },
    /// The movie metadata collaborator failed.
    #[error("movie lookup failed")]
    ExternalLookup(#[source] MetadataError),
    /// Operation would duplicate existing data.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Missing { entity, id } => {
                ServiceError::NotFound(format!("{entity} `{id}` not found"))
            }
            StorageError::Conflict(message) => ServiceError::Conflict(message),
            err @ StorageError::Unavailable { .. } => ServiceError::Unavailable(err),
        }
    }
}

impl From<MetadataError> for ServiceError {
    fn from(err: MetadataError) -> Self {
        ServiceError::ExternalLookup(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// An upstream collaborator failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            err @ ServiceError::PhaseMismatch { .. } => AppError::Conflict(err.to_string()),
            ServiceError::ExternalLookup(MetadataError::NotFound { title }) => {
                AppError::NotFound(format!("no movie found for `{title}`"))
            }
            ServiceError::ExternalLookup(source) => AppError::BadGateway(source.to_string()),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::InvalidState(message) => AppError::Internal(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => {
                ServiceError::InvalidState("state transition already pending".into())
            }
            PlanError::InvalidTransition(invalid) => {
                ServiceError::InvalidState(invalid.to_string())
            }
        }
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => ServiceError::InvalidState("no transition is pending".into()),
            ApplyError::IdMismatch { .. } => {
                ServiceError::InvalidState("pending transition does not match".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(
            status_of(ServiceError::NotFound("round".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::PhaseMismatch {
                expected: RoundPhase::Voting,
                actual: RoundPhase::Submission,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::InvalidInput("blank".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::ExternalLookup(MetadataError::Timeout {
                title: "Heat".into()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ServiceError::ExternalLookup(MetadataError::NotFound {
                title: "Heat".into()
            })),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn storage_errors_keep_their_meaning() {
        assert!(matches!(
            ServiceError::from(StorageError::missing("submission", 4)),
            ServiceError::NotFound(message) if message.contains("submission `4`")
        ));
        assert!(matches!(
            ServiceError::from(StorageError::Conflict("taken".into())),
            ServiceError::Conflict(_)
        ));
    }
}
