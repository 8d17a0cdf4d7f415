//! Transfer error types.
//!
//! Every rule the committer enforces before or during a ledger write maps to
//! one variant here. None of them is retried automatically.

use rust_decimal::Decimal;
use thiserror::Error;

use meridian_shared::AppError;
use meridian_shared::types::{TransactionId, UserId};

use crate::authorization::{AuthorizationType, rejection_message};

/// Errors raised by transfer and ledger rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// Malformed transfer input.
    #[error("Invalid transfer request: {0}")]
    Validation(String),

    /// The account holder has not passed identity verification.
    #[error("KYC verification required before making transfers")]
    KycNotVerified,

    /// An enabled step had no code.
    #[error("{} code is required", .0.label())]
    MissingAuthorizationCode(AuthorizationType),

    /// A code was unknown, used, expired or scoped to someone else.
    #[error("Invalid or already used {0} code")]
    InvalidAuthorizationCode(AuthorizationType),

    /// The balance does not cover amount plus fee.
    #[error("Insufficient funds. Required: {required:.2}, Available: {available:.2}")]
    InsufficientFunds {
        /// Amount plus fee.
        required: Decimal,
        /// Balance read inside the transaction.
        available: Decimal,
    },

    /// No account exists for the caller.
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// No ledger record with this id.
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// The record was already completed or failed.
    #[error("Transaction {0} is not pending")]
    TransactionNotPending(TransactionId),
}

impl TransferError {
    /// Returns the error code reported in action outcomes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::KycNotVerified => "KYC_NOT_VERIFIED",
            Self::MissingAuthorizationCode(_) => "MISSING_AUTHORIZATION_CODE",
            Self::InvalidAuthorizationCode(_) => "INVALID_AUTHORIZATION_CODE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransactionNotPending(_) => "TRANSACTION_NOT_PENDING",
        }
    }

    /// Message safe to show to the account holder.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => reason.clone(),
            Self::KycNotVerified => {
                "Please complete KYC verification before making transfers".to_string()
            }
            Self::InvalidAuthorizationCode(step) => rejection_message(*step),
            Self::UserNotFound(_) => "Account not found".to_string(),
            Self::TransactionNotFound(_) => "Transaction not found".to_string(),
            other => other.to_string(),
        }
    }

    /// The step that failed, for authorization errors.
    #[must_use]
    pub const fn failed_step(&self) -> Option<AuthorizationType> {
        match self {
            Self::MissingAuthorizationCode(step) | Self::InvalidAuthorizationCode(step) => {
                Some(*step)
            }
            _ => None,
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        let message = err.user_message();
        match err {
            TransferError::Validation(_) => Self::Validation(message),
            TransferError::KycNotVerified => Self::Policy(message),
            TransferError::MissingAuthorizationCode(_)
            | TransferError::InvalidAuthorizationCode(_) => Self::Authorization(message),
            TransferError::InsufficientFunds { .. } => Self::InsufficientFunds(message),
            TransferError::UserNotFound(_) | TransferError::TransactionNotFound(_) => {
                Self::NotFound(message)
            }
            TransferError::TransactionNotPending(_) => Self::Conflict(message),
        }
    }
}
