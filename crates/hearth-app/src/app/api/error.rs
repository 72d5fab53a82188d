//! Error-to-response mapping for the REST API.
//!
//! Handlers return `Result<Json<T>, ApiError>`; the `Writer` impl turns an
//! error into the matching status code and a JSON body, so no handler touches
//! status codes directly.

use salvo::{Depot, Request, Response, async_trait, http::StatusCode, writing::Json};
use serde::Serialize;
use tracing::error;

use crate::error::AppError;
use hearth_db::error::DbError;
use hearth_service::{error::ServiceError, validate::FieldError};

/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(Vec<FieldError>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    DbUnavailable,
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DbUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorResponse {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => ErrorResponse {
                error: message,
                details: None,
            },
            Self::Validation(errors) => ErrorResponse {
                error: "Validation error".to_string(),
                details: Some(errors),
            },
            Self::DbUnavailable => ErrorResponse {
                error: "Database unavailable".to_string(),
                details: None,
            },
            Self::Internal => ErrorResponse {
                error: "Internal server error".to_string(),
                details: None,
            },
        }
    }
}

#[async_trait]
impl salvo::Writer for ApiError {
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        res.status_code(self.status());
        res.render(Json(self.into_body()));
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotAuthenticated => {
                Self::Unauthorized("Authentication required".to_string())
            }
            ServiceError::AuthorizationError(message) => Self::Forbidden(message),
            ServiceError::NotFound(message) => Self::NotFound(message),
            ServiceError::Conflict(message) => Self::Conflict(message),
            ServiceError::ValidationError(message) | ServiceError::ParseError(message) => {
                Self::BadRequest(message)
            }
            ServiceError::DatabaseError(db_err) => db_err.into(),
            other => {
                error!(error = ?other, "Service error");
                Self::Internal
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PoolError(_) => {
                error!(error = ?err, "Failed to get database connection");
                Self::DbUnavailable
            }
            other => {
                error!(error = ?other, "Database error");
                Self::Internal
            }
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        error!(error = ?err, "Query failed");
        Self::Internal
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::ServiceError(service_err) => service_err.into(),
            AppError::DatabaseError(db_err) => db_err.into(),
            AppError::CoreError(core_err) => {
                error!(error = ?core_err, "Core error");
                Self::Internal
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        error!(error = ?err, "Serialization failed");
        Self::Internal
    }
}
