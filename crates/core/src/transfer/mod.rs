//! Transfer rules: request validation, fees and authorization sequencing.

pub mod error;
pub mod fee;
pub mod sequencer;
pub mod types;

#[cfg(test)]
mod fee_props;
#[cfg(test)]
mod sequencer_props;

pub use error::TransferError;
pub use fee::{DEFAULT_FEE_RATE, FeeSchedule, TransferQuote};
pub use sequencer::{AuthorizationSequencer, SequencerError, SequencerState};
pub use types::{TransferCommand, TransferRequest, check_amount};
