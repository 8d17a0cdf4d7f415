//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod authorization_code;
pub mod ledger;
pub mod retry;

pub use account::{AccountError, AccountRepository, NewAccount};
pub use authorization_code::AuthorizationCodeRepository;
pub use ledger::{BalanceChange, LedgerError, LedgerRepository, TransferReceipt};
pub use retry::retry_on_conflict;
