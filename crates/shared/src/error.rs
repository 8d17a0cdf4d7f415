//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Layer-specific errors (ledger, sequencer, accounts) map onto these
/// categories when they cross the action boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input, caught before any mutation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A platform policy forbids the operation (e.g. KYC not verified).
    #[error("Policy violation: {0}")]
    Policy(String),

    /// Missing, invalid or already-used authorization code.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Balance does not cover the requested debit.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Concurrent modification that could not be resolved.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code reported in action outcomes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Policy(_) => "POLICY_ERROR",
            Self::Authorization(_) => "AUTHORIZATION_ERROR",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the failure came from infrastructure rather than
    /// from the caller's input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_)
        )
    }
}
