use axum::http::StatusCode;
use thiserror::Error;

use crate::providers::ProviderError;

/// Error taxonomy for everything between a handler and the outside world.
/// Classified by origin so the HTTP mapping lives in exactly one place.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("billing error: {0}")]
    Billing(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Provider(e) => match e {
                // Contract violation on our side, not the vendor's.
                ProviderError::Unsupported { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                ProviderError::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ProviderError::Api { .. } | ProviderError::Transport { .. } => {
                    StatusCode::BAD_GATEWAY
                }
            },
            ServiceError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ServiceError::Database(_) | ServiceError::Cache(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::Billing(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServiceError::Validation("prompt is empty".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn vendor_failures_map_to_bad_gateway() {
        let err = ServiceError::Provider(ProviderError::Api {
            provider: "hailuo",
            status: 429,
            body: "quota exceeded".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = ServiceError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
