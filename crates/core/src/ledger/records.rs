//! Ledger record types.
//!
//! Records are append-only. Amounts are signed: negative values debit the
//! owner's balance, positive values credit it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use meridian_shared::types::{Currency, TransactionId, UserId};

use crate::authorization::{AuthorizationCodes, AuthorizationType};

/// What produced a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Outgoing transfer principal.
    Transfer,
    /// Fee charged on a transfer.
    Fee,
    /// Incoming deposit.
    Deposit,
    /// Loan proceeds paid into the account.
    LoanDisbursement,
    /// Administrative credit.
    ManualCredit,
    /// Administrative debit.
    ManualDebit,
}

impl TransactionType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Fee => "fee",
            Self::Deposit => "deposit",
            Self::LoanDisbursement => "loan_disbursement",
            Self::ManualCredit => "manual_credit",
            Self::ManualDebit => "manual_debit",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "transfer" => Some(Self::Transfer),
            "fee" => Some(Self::Fee),
            "deposit" => Some(Self::Deposit),
            "loan_disbursement" => Some(Self::LoanDisbursement),
            "manual_credit" => Some(Self::ManualCredit),
            "manual_debit" => Some(Self::ManualDebit),
            _ => None,
        }
    }

    /// Returns true if records of this type add to the balance.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(
            self,
            Self::Deposit | Self::LoanDisbursement | Self::ManualCredit
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a ledger record.
///
/// The only allowed change after creation is Pending to Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded but not yet applied to the balance.
    Pending,
    /// Applied to the balance.
    Completed,
    /// Abandoned.
    Failed,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Beneficiary metadata attached to a transfer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientDetails {
    /// Beneficiary name.
    pub name: String,
    /// Beneficiary account number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Beneficiary bank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Free-text remarks from the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Authorization codes kept on a transfer record for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDetails {
    /// COT code presented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cot_code: Option<String>,
    /// IMF code presented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imf_code: Option<String>,
    /// Tax code presented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<String>,
}

impl AuthorizationDetails {
    /// Collects the non-empty codes, or `None` when nothing was supplied.
    #[must_use]
    pub fn from_codes(codes: &AuthorizationCodes) -> Option<Self> {
        let supplied = codes.supplied();
        if supplied.is_empty() {
            return None;
        }
        let mut details = Self::default();
        for (step, code) in supplied {
            let slot = match step {
                AuthorizationType::Cot => &mut details.cot_code,
                AuthorizationType::Imf => &mut details.imf_code,
                AuthorizationType::Tax => &mut details.tax_code,
            };
            *slot = Some(code.to_string());
        }
        Some(details)
    }
}

/// A ledger record as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Record identifier.
    pub id: TransactionId,
    /// Owning account.
    pub user_id: UserId,
    /// Signed amount, 2 decimal places.
    pub amount: Decimal,
    /// Record type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Status.
    pub status: TransactionStatus,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Free-text description.
    pub description: String,
    /// Beneficiary for transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_details: Option<RecipientDetails>,
    /// Codes presented for transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_details: Option<AuthorizationDetails>,
    /// Transfer this record belongs to (fee records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_transfer_id: Option<TransactionId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// When the record was applied to the balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Direction of an administrative balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Add funds.
    Credit,
    /// Remove funds.
    Debit,
}

/// An administrative credit or debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    /// Credit or debit.
    pub kind: AdjustmentKind,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Reason shown on the record.
    pub description: String,
}

impl Adjustment {
    /// Creates a credit.
    #[must_use]
    pub fn credit(amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind: AdjustmentKind::Credit,
            amount,
            description: description.into(),
        }
    }

    /// Creates a debit.
    #[must_use]
    pub fn debit(amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind: AdjustmentKind::Debit,
            amount,
            description: description.into(),
        }
    }

    /// The balance delta this adjustment applies.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            AdjustmentKind::Credit => self.amount,
            AdjustmentKind::Debit => -self.amount,
        }
    }

    /// The record type written for this adjustment.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        match self.kind {
            AdjustmentKind::Credit => TransactionType::ManualCredit,
            AdjustmentKind::Debit => TransactionType::ManualDebit,
        }
    }
}
