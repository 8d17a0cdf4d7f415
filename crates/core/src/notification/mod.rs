//! Account alert messages.
//!
//! Each kind carries exactly the fields its email needs; rendering is an
//! exhaustive match so a new kind cannot fall through to a default body.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use meridian_shared::types::{Currency, TransactionId};

use crate::ledger::TransactionType;

/// Who receives an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addressee {
    /// Email address.
    pub email: String,
    /// Display name used in the greeting.
    pub name: String,
}

/// An email alert about a ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A transfer left the account.
    TransferDebit {
        /// Sender.
        to: Addressee,
        /// Principal sent.
        amount: Decimal,
        /// Fee charged.
        fee: Decimal,
        /// Transfer currency.
        currency: Currency,
        /// Beneficiary name.
        recipient_name: String,
        /// Balance after the transfer.
        new_balance: Decimal,
        /// Transfer record.
        transaction_id: TransactionId,
    },
    /// An administrative credit.
    AccountCredit {
        /// Account holder.
        to: Addressee,
        /// Amount credited.
        amount: Decimal,
        /// Currency.
        currency: Currency,
        /// Reason.
        description: String,
        /// Balance after the credit.
        new_balance: Decimal,
        /// Ledger record.
        transaction_id: TransactionId,
    },
    /// An administrative debit.
    AccountDebit {
        /// Account holder.
        to: Addressee,
        /// Amount debited.
        amount: Decimal,
        /// Currency.
        currency: Currency,
        /// Reason.
        description: String,
        /// Balance after the debit.
        new_balance: Decimal,
        /// Ledger record.
        transaction_id: TransactionId,
    },
    /// A pending record was completed and applied.
    TransactionCompleted {
        /// Account holder.
        to: Addressee,
        /// Signed amount applied.
        amount: Decimal,
        /// Currency.
        currency: Currency,
        /// Record type.
        transaction_type: TransactionType,
        /// Ledger record.
        transaction_id: TransactionId,
    },
}

impl Notification {
    /// The addressee of this alert.
    #[must_use]
    pub const fn recipient(&self) -> &Addressee {
        match self {
            Self::TransferDebit { to, .. }
            | Self::AccountCredit { to, .. }
            | Self::AccountDebit { to, .. }
            | Self::TransactionCompleted { to, .. } => to,
        }
    }

    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::TransferDebit {
                amount, currency, ..
            } => format!("Debit alert: {currency} {amount:.2} transfer sent"),
            Self::AccountCredit {
                amount, currency, ..
            } => format!("Credit alert: {currency} {amount:.2}"),
            Self::AccountDebit {
                amount, currency, ..
            } => format!("Debit alert: {currency} {amount:.2}"),
            Self::TransactionCompleted {
                transaction_type, ..
            } => format!("Your {} has been completed", transaction_type.as_str().replace('_', " ")),
        }
    }

    /// Plain-text email body.
    #[must_use]
    pub fn body(&self) -> String {
        let greeting = format!("Dear {},\n\n", self.recipient().name);
        let details = match self {
            Self::TransferDebit {
                amount,
                fee,
                currency,
                recipient_name,
                new_balance,
                transaction_id,
                ..
            } => format!(
                "A transfer of {currency} {amount:.2} to {recipient_name} was debited from your account.\n\
                 Fee: {currency} {fee:.2}\n\
                 Available balance: {currency} {new_balance:.2}\n\
                 Reference: {transaction_id}\n"
            ),
            Self::AccountCredit {
                amount,
                currency,
                description,
                new_balance,
                transaction_id,
                ..
            } => format!(
                "Your account was credited with {currency} {amount:.2}.\n\
                 Description: {description}\n\
                 Available balance: {currency} {new_balance:.2}\n\
                 Reference: {transaction_id}\n"
            ),
            Self::AccountDebit {
                amount,
                currency,
                description,
                new_balance,
                transaction_id,
                ..
            } => format!(
                "Your account was debited with {currency} {amount:.2}.\n\
                 Description: {description}\n\
                 Available balance: {currency} {new_balance:.2}\n\
                 Reference: {transaction_id}\n"
            ),
            Self::TransactionCompleted {
                amount,
                currency,
                transaction_type,
                transaction_id,
                ..
            } => format!(
                "Your pending {} of {currency} {amount:.2} has been completed.\n\
                 Reference: {transaction_id}\n",
                transaction_type.as_str().replace('_', " ")
            ),
        };
        format!("{greeting}{details}\nMeridian Bank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn addressee() -> Addressee {
        Addressee {
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
        }
    }

    #[test]
    fn test_transfer_debit_rendering() {
        let id = TransactionId::new();
        let notification = Notification::TransferDebit {
            to: addressee(),
            amount: dec!(200),
            fee: dec!(2),
            currency: Currency::Usd,
            recipient_name: "John".to_string(),
            new_balance: dec!(298),
            transaction_id: id,
        };
        assert_eq!(notification.recipient().email, "jane@example.com");
        assert_eq!(
            notification.subject(),
            "Debit alert: USD 200.00 transfer sent"
        );
        let body = notification.body();
        assert!(body.starts_with("Dear Jane,"));
        assert!(body.contains("USD 200.00 to John"));
        assert!(body.contains("Fee: USD 2.00"));
        assert!(body.contains("Available balance: USD 298.00"));
        assert!(body.contains(&id.to_string()));
    }

    #[test]
    fn test_completed_rendering_names_type() {
        let notification = Notification::TransactionCompleted {
            to: addressee(),
            amount: dec!(50),
            currency: Currency::Eur,
            transaction_type: TransactionType::LoanDisbursement,
            transaction_id: TransactionId::new(),
        };
        assert_eq!(
            notification.subject(),
            "Your loan disbursement has been completed"
        );
        assert!(notification.body().contains("EUR 50.00"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let notification = Notification::AccountCredit {
            to: addressee(),
            amount: dec!(10),
            currency: Currency::Gbp,
            description: "Refund".to_string(),
            new_balance: dec!(110),
            transaction_id: TransactionId::new(),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["kind"], "account_credit");
        assert_eq!(json["currency"], "GBP");
    }
}
