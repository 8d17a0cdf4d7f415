//! Shared fixtures for database integration tests.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use meridian_core::account::KycStatus;
use meridian_core::authorization::AuthorizationType;
use meridian_db::entities::{authorization_codes, users};
use meridian_db::{AccountRepository, AuthorizationCodeRepository, NewAccount, connect_in_memory};
use meridian_shared::types::{Currency, UserId};

/// Opens a fresh migrated database.
pub async fn setup() -> DatabaseConnection {
    connect_in_memory()
        .await
        .expect("Failed to open in-memory database")
}

/// Creates an account with the given balance and KYC status.
pub async fn account_with(
    db: &DatabaseConnection,
    balance: Decimal,
    kyc_status: KycStatus,
) -> users::Model {
    AccountRepository::new(db.clone())
        .create(NewAccount {
            email: format!("holder-{}@example.com", UserId::new()),
            full_name: "Jane Holder".to_string(),
            primary_currency: Currency::Usd,
            kyc_status,
            opening_balance: balance,
        })
        .await
        .expect("Failed to create account")
}

/// Creates a verified account.
pub async fn verified_account(db: &DatabaseConnection, balance: Decimal) -> users::Model {
    account_with(db, balance, KycStatus::Verified).await
}

/// Stores a code with a known value.
pub async fn code(
    db: &DatabaseConnection,
    value: &str,
    code_type: AuthorizationType,
    owner: Option<UserId>,
) -> authorization_codes::Model {
    AuthorizationCodeRepository::new(db.clone())
        .insert(value.to_string(), code_type, owner, None)
        .await
        .expect("Failed to insert code")
}
