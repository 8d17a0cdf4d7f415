//! Structured results returned by every action.

use rust_decimal::Decimal;
use serde::Serialize;

use meridian_shared::types::{Currency, TransactionId};

use crate::notifier::DeliveryTicket;

/// Result of a transfer commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    /// Whether the transfer was committed.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Machine-readable error code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Balance after the commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Decimal>,
    /// Transfer record id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
}

impl TransferOutcome {
    /// A committed transfer.
    #[must_use]
    pub fn committed(message: String, new_balance: Decimal, transaction_id: TransactionId) -> Self {
        Self {
            success: true,
            message,
            error: None,
            new_balance: Some(new_balance),
            transaction_id: Some(transaction_id),
        }
    }

    /// A rejected or failed transfer.
    #[must_use]
    pub fn failed(code: &str, message: String) -> Self {
        Self {
            success: false,
            message,
            error: Some(code.to_string()),
            new_balance: None,
            transaction_id: None,
        }
    }
}

/// Result of an action other than a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome<T> {
    /// Whether the action succeeded.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Machine-readable error code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionOutcome<T> {
    /// A successful action.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data: Some(data),
        }
    }

    /// A failed action.
    #[must_use]
    pub fn failed(code: &str, message: String) -> Self {
        Self {
            success: false,
            message,
            error: Some(code.to_string()),
            data: None,
        }
    }
}

/// Balance after an adjustment or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    /// Ledger record written or completed.
    pub transaction_id: TransactionId,
    /// Balance after the change.
    pub new_balance: Decimal,
    /// Account currency.
    pub currency: Currency,
}

/// An outcome plus the alert it queued, if any.
#[derive(Debug)]
pub struct Reported<O> {
    /// What the caller shows to the user.
    pub outcome: O,
    /// Completion handle for the queued alert.
    pub delivery: Option<DeliveryTicket>,
}

impl<O> Reported<O> {
    pub(crate) const fn silent(outcome: O) -> Self {
        Self {
            outcome,
            delivery: None,
        }
    }
}
