//! Transfer request and command types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use meridian_shared::types::{Currency, MONEY_SCALE, UserId};

use crate::authorization::AuthorizationCodes;
use crate::ledger::RecipientDetails;

use super::error::TransferError;

/// The transfer form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Beneficiary name.
    #[validate(
        length(max = 120, message = "Recipient name must be at most 120 characters"),
        custom(function = "validate_not_blank")
    )]
    pub recipient_name: String,
    /// Beneficiary account number.
    #[serde(default)]
    #[validate(length(max = 64, message = "Account number must be at most 64 characters"))]
    pub recipient_account: Option<String>,
    /// Beneficiary bank.
    #[serde(default)]
    #[validate(length(max = 120, message = "Bank name must be at most 120 characters"))]
    pub recipient_bank: Option<String>,
    /// Principal to send.
    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,
    /// Currency; the account's primary currency when absent.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Free-text remarks.
    #[serde(default)]
    #[validate(length(max = 500, message = "Remarks must be at most 500 characters"))]
    pub remarks: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Recipient name is required".into()));
    }
    Ok(())
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    let message = if *amount <= Decimal::ZERO {
        "Amount must be greater than zero"
    } else if amount.normalize().scale() > MONEY_SCALE {
        "Amount may have at most 2 decimal places"
    } else {
        return Ok(());
    };
    Err(ValidationError::new("amount").with_message(message.into()))
}

/// Checks a monetary amount on its own: positive, at most 2 decimal places.
///
/// Applies the same rule as the `amount` field of [`TransferRequest`].
pub fn check_amount(amount: Decimal) -> Result<(), TransferError> {
    validate_amount(&amount).map_err(|err| {
        TransferError::Validation(
            err.message
                .map_or_else(|| "Amount is invalid".to_string(), |m| m.to_string()),
        )
    })
}

/// Flattens validator output into one readable sentence.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                err.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

impl TransferRequest {
    /// Creates a request with only the required fields.
    #[must_use]
    pub fn new(recipient_name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            recipient_account: None,
            recipient_bank: None,
            amount,
            currency: None,
            remarks: None,
        }
    }

    /// Runs field validation.
    pub fn check(&self) -> Result<(), TransferError> {
        self.validate()
            .map_err(|errors| TransferError::Validation(describe(&errors)))
    }

    /// Currency of the transfer, defaulting to the account's.
    #[must_use]
    pub fn currency_or(&self, primary: Currency) -> Currency {
        self.currency.unwrap_or(primary)
    }

    /// Beneficiary metadata stored on the transfer record.
    #[must_use]
    pub fn recipient_details(&self) -> RecipientDetails {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        };
        RecipientDetails {
            name: self.recipient_name.trim().to_string(),
            account_number: non_blank(&self.recipient_account),
            bank_name: non_blank(&self.recipient_bank),
            remarks: non_blank(&self.remarks),
        }
    }

    /// Description written on the transfer record.
    #[must_use]
    pub fn description(&self) -> String {
        format!("Transfer to {}", self.recipient_name.trim())
    }
}

/// Everything the committer needs for one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCommand {
    /// Sending account.
    pub user_id: UserId,
    /// Form payload.
    pub request: TransferRequest,
    /// Codes collected by the sequencer.
    #[serde(default)]
    pub authorizations: AuthorizationCodes,
    /// Fee rate set by the caller, overriding the platform default.
    #[serde(default)]
    pub fee_override: Option<Decimal>,
}
