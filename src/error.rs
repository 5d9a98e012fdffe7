//! Domain error taxonomy shared by the reconciliation pipeline and handlers.

use thiserror::Error;

/// Failure classes surfaced over the message gateway.
///
/// Domain-level failures (`BadRequest`, `NotFound`, …) propagate unchanged
/// through the pipeline; only unexpected failures are wrapped as `Internal`.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// An entity kind reached a resolver that does not support it.
    #[error("Unsupported entity kind: {0}")]
    InvalidArgument(String),

    /// The external chatbot service answered with a non-success status.
    #[error("{0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<anyhow::Error> for DomainError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl DomainError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wire code carried in gateway error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(DomainError::bad_request("x").code(), "VALIDATION_ERROR");
        assert_eq!(DomainError::not_found("x").code(), "NOT_FOUND");
        assert_eq!(DomainError::Unauthorized("x".into()).code(), "UNAUTHORIZED");
        assert_eq!(
            DomainError::InvalidArgument("client".into()).code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(DomainError::internal("boom").code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_sqlx_errors_map_to_internal() {
        let err = DomainError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_display_passes_message_through() {
        let err = DomainError::not_found("Vehicle with registration XX not found");
        assert_eq!(err.to_string(), "Vehicle with registration XX not found");
    }
}
