//! Client-side authorization step sequencer.
//!
//! Walks the enabled steps in the fixed order COT, IMF, Tax and collects one
//! code per presented step before the commit call. The committer validates
//! every code again, so nothing here is authoritative.
//!
//! Transitions:
//! - Idle → first enabled step, or Committing when none is enabled (begin)
//! - Awaiting step → next enabled step, or Committing (submit_code)
//! - Awaiting step → Cancelled (cancel)
//! - Committing → Done (commit_succeeded)
//! - Committing → Cancelled (commit_failed)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::authorization::{AuthorizationCodes, AuthorizationPolicy, AuthorizationType};

use super::error::TransferError;
use super::fee::{FeeSchedule, TransferQuote};
use super::types::check_amount;

/// Where the sequencer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    /// Form not yet submitted.
    Idle,
    /// Waiting for the Cost-of-Transfer code.
    AwaitingCot,
    /// Waiting for the IMF code.
    AwaitingImf,
    /// Waiting for the tax clearance code.
    AwaitingTax,
    /// All codes collected, commit in flight.
    Committing,
    /// Commit succeeded.
    Done,
    /// Dismissed by the user or failed commit.
    Cancelled,
}

impl SequencerState {
    /// The dialog state for a step.
    #[must_use]
    pub const fn awaiting(step: AuthorizationType) -> Self {
        match step {
            AuthorizationType::Cot => Self::AwaitingCot,
            AuthorizationType::Imf => Self::AwaitingImf,
            AuthorizationType::Tax => Self::AwaitingTax,
        }
    }

    /// The step whose dialog is open, if any.
    #[must_use]
    pub const fn awaiting_step(&self) -> Option<AuthorizationType> {
        match self {
            Self::AwaitingCot => Some(AuthorizationType::Cot),
            Self::AwaitingImf => Some(AuthorizationType::Imf),
            Self::AwaitingTax => Some(AuthorizationType::Tax),
            _ => None,
        }
    }

    /// Returns true once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingCot => "awaiting_cot",
            Self::AwaitingImf => "awaiting_imf",
            Self::AwaitingTax => "awaiting_tax",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the sequencer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequencerError {
    /// The action is not allowed in the current state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        /// Current state.
        state: SequencerState,
        /// Attempted action.
        action: &'static str,
    },

    /// The entered code does not meet the step's format rule.
    #[error("{reason}")]
    CodeRejected {
        /// Step whose dialog stays open.
        step: AuthorizationType,
        /// Message shown in the dialog.
        reason: String,
    },

    /// The pre-check rejected the amount, the fee rate or the balance.
    #[error(transparent)]
    PreCheck(#[from] TransferError),
}

impl SequencerError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::CodeRejected { .. } => "CODE_REJECTED",
            Self::PreCheck(inner) => inner.error_code(),
        }
    }
}

/// Sequences the authorization dialogs of one transfer attempt.
#[derive(Debug, Clone)]
pub struct AuthorizationSequencer {
    policy: AuthorizationPolicy,
    state: SequencerState,
    codes: AuthorizationCodes,
    presented: Vec<AuthorizationType>,
    last_error: Option<String>,
}

impl AuthorizationSequencer {
    /// Creates an idle sequencer for the given policy.
    #[must_use]
    pub fn new(policy: AuthorizationPolicy) -> Self {
        Self {
            policy,
            state: SequencerState::Idle,
            codes: AuthorizationCodes::default(),
            presented: Vec::new(),
            last_error: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SequencerState {
        self.state
    }

    /// Steps whose dialog has been shown so far, in order.
    #[must_use]
    pub fn presented_steps(&self) -> &[AuthorizationType] {
        &self.presented
    }

    /// Message of the failed commit, if the sequence ended that way.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts the sequence after the form is submitted.
    ///
    /// Malformed amounts and fee rates are rejected before the balance
    /// pre-check, which uses the client's fee estimate. Any failure keeps
    /// the sequencer idle.
    pub fn begin(
        &mut self,
        balance: Decimal,
        amount: Decimal,
        fee_rate: Decimal,
    ) -> Result<SequencerState, SequencerError> {
        self.expect(SequencerState::Idle, "begin")?;
        check_amount(amount)?;
        let fee_rate = FeeSchedule::resolve(Some(fee_rate), None)?;
        TransferQuote::compute(amount, fee_rate)?.settle(balance)?;
        Ok(self.advance(None))
    }

    /// Submits the code for the open dialog.
    ///
    /// A rejected code leaves the dialog open.
    pub fn submit_code(&mut self, code: &str) -> Result<SequencerState, SequencerError> {
        let step = self
            .state
            .awaiting_step()
            .ok_or(SequencerError::InvalidTransition {
                state: self.state,
                action: "submit a code",
            })?;

        let code = code.trim();
        self.check_format(step, code)?;
        self.codes.set(step, code);
        Ok(self.advance(Some(step)))
    }

    /// Dismisses the open dialog and forgets every collected code.
    pub fn cancel(&mut self) -> Result<SequencerState, SequencerError> {
        if self.state.awaiting_step().is_none() {
            return Err(SequencerError::InvalidTransition {
                state: self.state,
                action: "cancel",
            });
        }
        self.codes.clear();
        self.state = SequencerState::Cancelled;
        Ok(self.state)
    }

    /// Codes to send with the commit call.
    pub fn authorizations(&self) -> Result<&AuthorizationCodes, SequencerError> {
        self.expect(SequencerState::Committing, "read authorizations")?;
        Ok(&self.codes)
    }

    /// Records a successful commit.
    pub fn commit_succeeded(&mut self) -> Result<SequencerState, SequencerError> {
        self.expect(SequencerState::Committing, "complete")?;
        self.state = SequencerState::Done;
        Ok(self.state)
    }

    /// Records a failed commit. No retry is attempted.
    pub fn commit_failed(
        &mut self,
        message: impl Into<String>,
    ) -> Result<SequencerState, SequencerError> {
        self.expect(SequencerState::Committing, "fail")?;
        self.codes.clear();
        self.last_error = Some(message.into());
        self.state = SequencerState::Cancelled;
        Ok(self.state)
    }

    fn expect(&self, state: SequencerState, action: &'static str) -> Result<(), SequencerError> {
        if self.state == state {
            Ok(())
        } else {
            Err(SequencerError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn check_format(&self, step: AuthorizationType, code: &str) -> Result<(), SequencerError> {
        let reason = match step {
            AuthorizationType::Imf => {
                let min = self.policy.imf_min_length.max(1);
                (code.chars().count() < min)
                    .then(|| format!("IMF code must be at least {min} characters"))
            }
            AuthorizationType::Cot | AuthorizationType::Tax => code
                .is_empty()
                .then(|| format!("Please enter the {} code", step.label())),
        };
        match reason {
            Some(reason) => Err(SequencerError::CodeRejected { step, reason }),
            None => Ok(()),
        }
    }

    fn advance(&mut self, after: Option<AuthorizationType>) -> SequencerState {
        self.state = match self.policy.next_step(after) {
            Some(step) => {
                self.presented.push(step);
                SequencerState::awaiting(step)
            }
            None => SequencerState::Committing,
        };
        self.state
    }
}
