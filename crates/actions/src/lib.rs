//! In-process banking actions.
//!
//! This crate provides:
//! - [`BankingActions`], the boundary that turns every repository error
//!   into a structured outcome
//! - [`NotificationQueue`], best-effort alert delivery with observable
//!   completion

pub mod banking;
pub mod notifier;
pub mod outcome;

pub use banking::BankingActions;
pub use notifier::{DeliveryStatus, DeliveryTicket, NotificationQueue};
pub use outcome::{ActionOutcome, BalanceUpdate, Reported, TransferOutcome};
