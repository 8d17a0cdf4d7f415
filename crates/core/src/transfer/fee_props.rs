//! Property-based tests for fee quoting.
//!
//! Amounts are generated in minor units so every input is a valid 2-dp value.

use proptest::prelude::*;
use rust_decimal::Decimal;

use meridian_shared::types::round_money;

use crate::transfer::error::TransferError;
use crate::transfer::fee::TransferQuote;

/// Strategy for amounts between 0.01 and 1,000,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for fee rates between 0% and 10% in basis points.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000).prop_map(|bps| Decimal::new(bps, 4))
}

/// Strategy for balances between 0 and 2,000,000.00.
fn arb_balance() -> impl Strategy<Value = Decimal> {
    (0i64..200_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Successful settlement conserves money exactly.
    #[test]
    fn prop_settle_conserves_balance(
        amount in arb_amount(),
        rate in arb_rate(),
        balance in arb_balance(),
    ) {
        let quote = TransferQuote::compute(amount, rate).unwrap();
        prop_assert_eq!(quote.fee, round_money(amount * rate));
        prop_assert_eq!(quote.total, amount + quote.fee);

        match quote.settle(balance) {
            Ok(new_balance) => {
                prop_assert!(balance >= quote.total);
                prop_assert_eq!(new_balance, balance - amount - quote.fee);
                prop_assert!(new_balance >= Decimal::ZERO);
            }
            Err(TransferError::InsufficientFunds { required, available }) => {
                prop_assert!(balance < quote.total);
                prop_assert_eq!(required, quote.total);
                prop_assert_eq!(available, balance);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Fees never exceed the principal and carry at most 2 decimal places.
    #[test]
    fn prop_fee_bounded(amount in arb_amount(), rate in arb_rate()) {
        let quote = TransferQuote::compute(amount, rate).unwrap();
        prop_assert!(quote.fee >= Decimal::ZERO);
        prop_assert!(quote.fee <= amount);
        prop_assert!(quote.fee.normalize().scale() <= 2);
    }
}
