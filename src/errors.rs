//! Application error type.
//!
//! Every handler returns `AppResult<T>`; any `AppError` escaping a handler is
//! rendered as the uniform JSON envelope `{success: false, message, error?}`
//! with the matching HTTP status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::error_body;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)          => StatusCode::BAD_REQUEST,
            AppError::Unauthorized           => StatusCode::UNAUTHORIZED,
            AppError::Forbidden              => StatusCode::FORBIDDEN,
            AppError::NotFound               => StatusCode::NOT_FOUND,
            AppError::Conflict(_)            => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TooManyRequests        => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_)            => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    /// Map store-level failures to the service-boundary taxonomy:
    /// missing rows become 404, uniqueness / FK violations become 409,
    /// everything else is internal.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23000") => AppError::Conflict("Constraint violation".into()),
                _ => AppError::Internal(anyhow::anyhow!(err)),
            },
            _ => AppError::Internal(anyhow::anyhow!(err)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Never leak internal error details to the client.
        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                "Something went wrong".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(error_body(&message, None))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound));
    }
}
