//! Core business logic for Meridian.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `account` - Account holder status
//! - `authorization` - Authorization steps, policy and code rules
//! - `transfer` - Transfer validation, fees and the authorization sequencer
//! - `ledger` - Ledger record types
//! - `notification` - Account alert messages

pub mod account;
pub mod authorization;
pub mod ledger;
pub mod notification;
pub mod transfer;
