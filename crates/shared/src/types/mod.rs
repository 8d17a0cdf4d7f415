//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{
    Currency, MONEY_SCALE, Money, MoneyError, from_minor_units, round_money, to_minor_units,
};
pub use pagination::{PageMeta, PageRequest, PageResponse};
