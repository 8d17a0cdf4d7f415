//! Account repository for provisioning and KYC status.
//!
//! Balances are never written here; every balance change goes through
//! [`super::ledger::LedgerRepository`].

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use thiserror::Error;
use tracing::info;

use meridian_core::account::KycStatus;
use meridian_shared::AppError;
use meridian_shared::types::{Currency, UserId, to_minor_units};

use crate::entities::users;

/// Errors raised by account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// No account with this id.
    #[error("User {0} not found")]
    NotFound(UserId),

    /// Rejected input.
    #[error("Invalid account data: {0}")]
    InvalidInput(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => Self::NotFound(err.to_string()),
            AccountError::InvalidInput(_) => Self::Validation(err.to_string()),
            AccountError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Input for provisioning an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Login and alert address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Account currency.
    pub primary_currency: Currency,
    /// Initial KYC status.
    pub kyc_status: KycStatus,
    /// Opening balance.
    pub opening_balance: Decimal,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative or out-of-range opening
    /// balance, or a database error (e.g. duplicate email).
    pub async fn create(&self, input: NewAccount) -> Result<users::Model, AccountError> {
        if input.opening_balance < Decimal::ZERO {
            return Err(AccountError::InvalidInput(
                "Opening balance cannot be negative".to_string(),
            ));
        }
        let balance_minor = to_minor_units(input.opening_balance)
            .map_err(|err| AccountError::InvalidInput(err.to_string()))?;

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            email: Set(input.email.trim().to_lowercase()),
            full_name: Set(input.full_name),
            balance_minor: Set(balance_minor),
            primary_currency: Set(input.primary_currency.code().to_string()),
            kyc_status: Set(input.kyc_status.into()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let user = user.insert(&self.db).await?;
        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Finds an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
    }

    /// Updates the KYC status.
    ///
    /// Bumps the row version so an in-flight ledger write retries against
    /// the new status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown accounts or a database error.
    pub async fn set_kyc_status(
        &self,
        id: UserId,
        status: KycStatus,
    ) -> Result<users::Model, AccountError> {
        let result = users::Entity::update_many()
            .col_expr(
                users::Column::KycStatus,
                Expr::value(crate::entities::sea_orm_active_enums::KycStatus::from(status)),
            )
            .col_expr(
                users::Column::Version,
                Expr::col(users::Column::Version).add(1),
            )
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(users::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AccountError::NotFound(id));
        }

        info!(user_id = %id, kyc_status = %status, "KYC status updated");
        self.find_by_id(id).await?.ok_or(AccountError::NotFound(id))
    }
}
