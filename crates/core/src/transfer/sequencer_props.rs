//! Property-based tests for the authorization sequencer.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::authorization::{AuthorizationPolicy, AuthorizationType};
use crate::transfer::sequencer::{AuthorizationSequencer, SequencerState};

/// Strategy for random policies with the default IMF minimum.
fn arb_policy() -> impl Strategy<Value = AuthorizationPolicy> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(cot, imf, tax)| {
        AuthorizationPolicy {
            require_cot: cot,
            require_imf: imf,
            require_tax: tax,
            imf_min_length: 5,
        }
    })
}

/// Strategy for codes that satisfy every step's format rule.
fn arb_code() -> impl Strategy<Value = String> {
    "[A-Z0-9]{5,12}"
}

fn started(policy: AuthorizationPolicy) -> AuthorizationSequencer {
    let mut seq = AuthorizationSequencer::new(policy);
    let state = seq.begin(Decimal::new(50_000, 2), Decimal::new(20_000, 2), Decimal::new(1, 2));
    assert!(state.is_ok());
    seq
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The dialogs shown are exactly the enabled steps, in order, and the
    /// collected codes cover exactly those steps.
    #[test]
    fn prop_presents_enabled_steps_in_order(
        policy in arb_policy(),
        codes in prop::collection::vec(arb_code(), 3),
    ) {
        let mut seq = started(policy);
        let mut submitted = 0;
        while seq.state().awaiting_step().is_some() {
            prop_assert!(seq.submit_code(&codes[submitted]).is_ok());
            submitted += 1;
        }

        prop_assert_eq!(seq.state(), SequencerState::Committing);
        prop_assert_eq!(seq.presented_steps().to_vec(), policy.enabled_steps());

        let collected = seq.authorizations().unwrap();
        for step in AuthorizationType::ALL {
            prop_assert_eq!(collected.get(step).is_some(), policy.requires(step));
        }
    }

    /// Cancelling at any dialog leaves no collected codes behind.
    #[test]
    fn prop_cancel_discards_everything(
        policy in arb_policy(),
        cancel_after in 0usize..3,
        code in arb_code(),
    ) {
        let mut seq = started(policy);
        for _ in 0..cancel_after {
            if seq.state().awaiting_step().is_none() {
                break;
            }
            prop_assert!(seq.submit_code(&code).is_ok());
        }

        if seq.state().awaiting_step().is_some() {
            prop_assert_eq!(seq.cancel().unwrap(), SequencerState::Cancelled);
            prop_assert!(seq.authorizations().is_err());
            prop_assert!(seq.commit_succeeded().is_err());
        } else {
            prop_assert!(seq.cancel().is_err());
        }
    }
}
