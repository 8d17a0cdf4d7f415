//! Ledger record types shared by the committer and history queries.

pub mod records;

pub use records::{
    Adjustment, AdjustmentKind, AuthorizationDetails, RecipientDetails, TransactionRecord,
    TransactionStatus, TransactionType,
};
