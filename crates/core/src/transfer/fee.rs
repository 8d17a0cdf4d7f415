//! Fee resolution and transfer quoting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use meridian_shared::types::round_money;

use super::error::TransferError;

/// Fee rate used when neither the caller nor the platform sets one (1%).
pub const DEFAULT_FEE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Picks the effective fee rate for a transfer.
pub struct FeeSchedule;

impl FeeSchedule {
    /// Returns the override, else the platform default, else 1%.
    ///
    /// Rates are fractions and must lie in `[0, 1)`.
    pub fn resolve(
        fee_override: Option<Decimal>,
        platform_default: Option<Decimal>,
    ) -> Result<Decimal, TransferError> {
        let rate = fee_override.or(platform_default).unwrap_or(DEFAULT_FEE_RATE);
        if rate < Decimal::ZERO || rate >= Decimal::ONE {
            return Err(TransferError::Validation(format!(
                "Fee rate {rate} must be at least 0 and below 1"
            )));
        }
        Ok(rate)
    }
}

/// Amount, fee and total for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuote {
    /// Principal sent to the recipient.
    pub amount: Decimal,
    /// Rate the fee was computed with.
    pub fee_rate: Decimal,
    /// `round(amount × fee_rate, 2)`.
    pub fee: Decimal,
    /// `amount + fee`.
    pub total: Decimal,
}

impl TransferQuote {
    /// Computes the fee and total for `amount` at `fee_rate`.
    ///
    /// Fails with a validation error when the total is not representable.
    pub fn compute(amount: Decimal, fee_rate: Decimal) -> Result<Self, TransferError> {
        let amount = round_money(amount);
        let fee = amount
            .checked_mul(fee_rate)
            .map(round_money)
            .ok_or_else(|| too_large(amount))?;
        let total = amount.checked_add(fee).ok_or_else(|| too_large(amount))?;
        Ok(Self {
            amount,
            fee_rate,
            fee,
            total,
        })
    }

    /// Returns the balance left after paying the total.
    pub fn settle(&self, balance: Decimal) -> Result<Decimal, TransferError> {
        if balance < self.total {
            return Err(TransferError::InsufficientFunds {
                required: self.total,
                available: balance,
            });
        }
        Ok(round_money(balance - self.total))
    }

    /// Returns true if a separate fee record is written.
    #[must_use]
    pub fn has_fee(&self) -> bool {
        self.fee > Decimal::ZERO
    }
}

fn too_large(amount: Decimal) -> TransferError {
    TransferError::Validation(format!("Amount {amount} is too large"))
}
