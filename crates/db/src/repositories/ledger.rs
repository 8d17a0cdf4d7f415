//! Ledger repository: transfer commits, adjustments and history.
//!
//! Every balance change runs inside one database transaction that re-reads
//! the account, writes the new balance conditionally on the version it read
//! and appends the matching records. A lost race rolls back and re-runs the
//! whole body (see [`retry_on_conflict`]).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use meridian_core::account::KycStatus;
use meridian_core::authorization::{AuthorizationPolicy, AuthorizationType};
use meridian_core::ledger::{
    Adjustment, AuthorizationDetails, RecipientDetails, TransactionRecord, TransactionStatus,
    TransactionType,
};
use meridian_core::notification::Addressee;
use meridian_core::transfer::{
    FeeSchedule, TransferCommand, TransferError, TransferQuote, check_amount,
};
use meridian_shared::AppError;
use meridian_shared::types::{
    AuthorizationCodeId, Currency, PageRequest, PageResponse, TransactionId, UserId,
    from_minor_units, to_minor_units,
};

use super::authorization_code::{consume_code, validate_code};
use super::retry::retry_on_conflict;
use crate::entities::{sea_orm_active_enums, transactions, users};

/// Default number of attempts for one ledger write.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Rule(#[from] TransferError),

    /// Another writer changed the account between read and write.
    #[error("Concurrent modification detected for user {0}, please retry")]
    ConcurrentModification(UserId),

    /// Every attempt lost a write race.
    #[error("Gave up after {attempts} conflicting attempts")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// A stored row could not be interpreted.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerError {
    /// Returns true if re-running the transaction may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }

    /// Returns the error code reported in action outcomes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Rule(rule) => rule.error_code(),
            Self::ConcurrentModification(_) | Self::RetriesExhausted { .. } => "CONFLICT",
            Self::InvalidData(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Message safe to show to the account holder.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rule(rule) => rule.user_message(),
            Self::ConcurrentModification(_) | Self::RetriesExhausted { .. } => {
                "Your account is busy, please try again".to_string()
            }
            Self::InvalidData(_) | Self::Database(_) => {
                "An unexpected error occurred, please try again later".to_string()
            }
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rule(rule) => rule.into(),
            LedgerError::ConcurrentModification(_) | LedgerError::RetriesExhausted { .. } => {
                Self::Conflict(err.to_string())
            }
            LedgerError::InvalidData(_) => Self::Internal(err.to_string()),
            LedgerError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Outcome of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    /// Transfer record.
    pub transaction_id: TransactionId,
    /// Fee record, when a fee was charged.
    pub fee_transaction_id: Option<TransactionId>,
    /// Amount, fee and total.
    pub quote: TransferQuote,
    /// Balance after the commit.
    pub new_balance: Decimal,
    /// Currency of both records.
    pub currency: Currency,
    /// Beneficiary name.
    pub recipient_name: String,
    /// Codes consumed by the commit, in step order.
    pub consumed_codes: Vec<AuthorizationCodeId>,
    /// Sender, for the debit alert.
    pub holder: Addressee,
}

/// Outcome of an adjustment or a completed pending record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    /// The record written or completed.
    pub record: TransactionRecord,
    /// Balance after the change.
    pub new_balance: Decimal,
    /// Account holder, for the alert.
    pub holder: Addressee,
}

/// A code that passed validation before the transaction opened.
#[derive(Debug, Clone, Copy)]
struct ValidatedCode {
    step: AuthorizationType,
    id: AuthorizationCodeId,
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    max_attempts: u32,
}

impl LedgerRepository {
    /// Creates a ledger repository with the default retry budget.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets how many times a conflicting write is attempted.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Commits a transfer.
    ///
    /// Checks, in order and before any write: the account and its KYC
    /// status, the request, the fee rate, then every enabled authorization
    /// step.
    /// The balance debit, the transfer record, the optional fee record and
    /// the consumption of each validated code then happen in one database
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Rule`] when a rule rejects the transfer, and
    /// a conflict or database error otherwise. Nothing is written on error.
    pub async fn commit_transfer(
        &self,
        command: &TransferCommand,
        policy: &AuthorizationPolicy,
        platform_fee_rate: Option<Decimal>,
    ) -> Result<TransferReceipt, LedgerError> {
        let user = users::Entity::find_by_id(command.user_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(TransferError::UserNotFound(command.user_id))?;
        if !KycStatus::from(user.kyc_status).permits_transfers() {
            info!(user_id = %command.user_id, "Transfer rejected, KYC not verified");
            return Err(TransferError::KycNotVerified.into());
        }

        command.request.check()?;
        let amount_minor = minor_units(command.request.amount)?;
        let fee_rate = FeeSchedule::resolve(command.fee_override, platform_fee_rate)?;
        let codes = self.validate_codes(command, policy).await?;
        let currency = command.request.currency_or(parse_currency(&user)?);
        let quote = TransferQuote::compute(from_minor_units(amount_minor), fee_rate)?;

        let receipt = retry_on_conflict(self.max_attempts, |attempt| {
            self.commit_transfer_once(command, &codes, quote, currency, attempt)
        })
        .await?;

        info!(
            user_id = %command.user_id,
            transaction_id = %receipt.transaction_id,
            amount = %quote.amount,
            fee = %quote.fee,
            new_balance = %receipt.new_balance,
            "Transfer committed"
        );
        Ok(receipt)
    }

    /// Validates the code of every enabled step. Codes for disabled steps
    /// are ignored.
    async fn validate_codes(
        &self,
        command: &TransferCommand,
        policy: &AuthorizationPolicy,
    ) -> Result<Vec<ValidatedCode>, LedgerError> {
        let now = Utc::now();
        let mut validated = Vec::new();
        for step in policy.enabled_steps() {
            let code = command
                .authorizations
                .get(step)
                .ok_or(TransferError::MissingAuthorizationCode(step))?;
            let validation =
                validate_code(&self.db, code, step, Some(command.user_id), now).await?;
            match validation.code_id {
                Some(id) if validation.valid => validated.push(ValidatedCode { step, id }),
                _ => {
                    info!(user_id = %command.user_id, code_type = %step, "Authorization code rejected");
                    return Err(TransferError::InvalidAuthorizationCode(step).into());
                }
            }
        }
        Ok(validated)
    }

    async fn commit_transfer_once(
        &self,
        command: &TransferCommand,
        codes: &[ValidatedCode],
        quote: TransferQuote,
        currency: Currency,
        attempt: u32,
    ) -> Result<TransferReceipt, LedgerError> {
        debug!(user_id = %command.user_id, attempt, "Opening transfer transaction");
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let user = load_user(&txn, command.user_id).await?;
        let new_balance = quote.settle(from_minor_units(user.balance_minor))?;
        write_balance(&txn, &user, minor_units(new_balance)?, now).await?;

        let transfer_id = TransactionId::new();
        let recipient = command.request.recipient_details();
        let recipient_name = recipient.name.clone();
        let authorization = AuthorizationDetails::from_codes(&command.authorizations);
        transactions::ActiveModel {
            id: Set(transfer_id.into_inner()),
            user_id: Set(user.id),
            amount_minor: Set(-minor_units(quote.amount)?),
            transaction_type: Set(TransactionType::Transfer.into()),
            status: Set(TransactionStatus::Completed.into()),
            currency: Set(currency.code().to_string()),
            description: Set(command.request.description()),
            recipient_details: Set(Some(to_json(&recipient)?)),
            authorization_details: Set(authorization.as_ref().map(to_json).transpose()?),
            related_transfer_id: Set(None),
            created_at: Set(now.into()),
            completed_at: Set(Some(now.into())),
        }
        .insert(&txn)
        .await?;

        let fee_transaction_id = if quote.has_fee() {
            let fee_id = TransactionId::new();
            transactions::ActiveModel {
                id: Set(fee_id.into_inner()),
                user_id: Set(user.id),
                amount_minor: Set(-minor_units(quote.fee)?),
                transaction_type: Set(TransactionType::Fee.into()),
                status: Set(TransactionStatus::Completed.into()),
                currency: Set(currency.code().to_string()),
                description: Set(format!("Transfer fee for {}", command.request.description())),
                recipient_details: Set(None),
                authorization_details: Set(None),
                related_transfer_id: Set(Some(transfer_id.into_inner())),
                created_at: Set(now.into()),
                completed_at: Set(Some(now.into())),
            }
            .insert(&txn)
            .await?;
            Some(fee_id)
        } else {
            None
        };

        for code in codes {
            if !consume_code(&txn, code.id, now).await? {
                // Consumed by a concurrent commit since validation
                return Err(TransferError::InvalidAuthorizationCode(code.step).into());
            }
        }

        txn.commit().await?;

        Ok(TransferReceipt {
            transaction_id: transfer_id,
            fee_transaction_id,
            quote,
            new_balance,
            currency,
            recipient_name,
            consumed_codes: codes.iter().map(|code| code.id).collect(),
            holder: user.addressee(),
        })
    }

    /// Applies an administrative credit or debit with its ledger record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-positive amounts or amounts with
    /// more than 2 decimal places, insufficient
    /// funds for debits larger than the balance, and conflict or database
    /// errors otherwise.
    pub async fn apply_adjustment(
        &self,
        user_id: UserId,
        adjustment: &Adjustment,
    ) -> Result<BalanceChange, LedgerError> {
        check_amount(adjustment.amount)?;
        let delta = minor_units(adjustment.signed_amount())?;

        let change = retry_on_conflict(self.max_attempts, |attempt| {
            self.apply_adjustment_once(user_id, adjustment, delta, attempt)
        })
        .await?;

        info!(
            user_id = %user_id,
            transaction_id = %change.record.id,
            kind = ?adjustment.kind,
            amount = %adjustment.amount,
            "Balance adjusted"
        );
        Ok(change)
    }

    async fn apply_adjustment_once(
        &self,
        user_id: UserId,
        adjustment: &Adjustment,
        delta: i64,
        attempt: u32,
    ) -> Result<BalanceChange, LedgerError> {
        debug!(user_id = %user_id, attempt, "Opening adjustment transaction");
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let user = load_user(&txn, user_id).await?;
        let new_minor = apply_delta(&user, delta)?;
        write_balance(&txn, &user, new_minor, now).await?;

        let record = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            user_id: Set(user.id),
            amount_minor: Set(delta),
            transaction_type: Set(adjustment.transaction_type().into()),
            status: Set(TransactionStatus::Completed.into()),
            currency: Set(user.primary_currency.clone()),
            description: Set(adjustment.description.clone()),
            recipient_details: Set(None),
            authorization_details: Set(None),
            related_transfer_id: Set(None),
            created_at: Set(now.into()),
            completed_at: Set(Some(now.into())),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(BalanceChange {
            record: to_record(record)?,
            new_balance: from_minor_units(new_minor),
            holder: user.addressee(),
        })
    }

    /// Records an incoming deposit that is not yet applied to the balance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-positive amounts or amounts with
    /// more than 2 decimal places, `UserNotFound`
    /// for unknown accounts, or a database error.
    pub async fn record_pending_deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<TransactionRecord, LedgerError> {
        check_amount(amount)?;
        let user = load_user(&self.db, user_id).await?;
        let now = Utc::now();

        let record = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            user_id: Set(user.id),
            amount_minor: Set(minor_units(amount)?),
            transaction_type: Set(TransactionType::Deposit.into()),
            status: Set(TransactionStatus::Pending.into()),
            currency: Set(user.primary_currency.clone()),
            description: Set(description.to_string()),
            recipient_details: Set(None),
            authorization_details: Set(None),
            related_transfer_id: Set(None),
            created_at: Set(now.into()),
            completed_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        debug!(user_id = %user_id, transaction_id = %record.id, "Pending deposit recorded");
        to_record(record)
    }

    /// Completes a pending record: flips its status and applies its amount
    /// to the owner's balance atomically.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, `TransactionNotPending`, or
    /// `InsufficientFunds` when a pending debit exceeds the balance.
    pub async fn complete_pending(
        &self,
        transaction_id: TransactionId,
    ) -> Result<BalanceChange, LedgerError> {
        let change = retry_on_conflict(self.max_attempts, |attempt| {
            self.complete_pending_once(transaction_id, attempt)
        })
        .await?;

        info!(
            user_id = %change.record.user_id,
            transaction_id = %transaction_id,
            "Pending transaction completed"
        );
        Ok(change)
    }

    async fn complete_pending_once(
        &self,
        transaction_id: TransactionId,
        attempt: u32,
    ) -> Result<BalanceChange, LedgerError> {
        debug!(transaction_id = %transaction_id, attempt, "Opening completion transaction");
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let record = transactions::Entity::find_by_id(transaction_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(TransferError::TransactionNotFound(transaction_id))?;
        if record.status != sea_orm_active_enums::TransactionStatus::Pending {
            return Err(TransferError::TransactionNotPending(transaction_id).into());
        }

        let user = load_user(&txn, UserId::from_uuid(record.user_id)).await?;
        let new_minor = apply_delta(&user, record.amount_minor)?;
        write_balance(&txn, &user, new_minor, now).await?;

        let flipped = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(sea_orm_active_enums::TransactionStatus::Completed),
            )
            .col_expr(
                transactions::Column::CompletedAt,
                Expr::value(Some(now.fixed_offset())),
            )
            .filter(transactions::Column::Id.eq(record.id))
            .filter(
                transactions::Column::Status.eq(sea_orm_active_enums::TransactionStatus::Pending),
            )
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            return Err(LedgerError::ConcurrentModification(user.user_id()));
        }

        txn.commit().await?;

        let completed = transactions::Model {
            status: sea_orm_active_enums::TransactionStatus::Completed,
            completed_at: Some(now.into()),
            ..record
        };
        Ok(BalanceChange {
            record: to_record(completed)?,
            new_balance: from_minor_units(new_minor),
            holder: user.addressee(),
        })
    }

    /// Finds one ledger record.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub async fn find_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<TransactionRecord>, LedgerError> {
        transactions::Entity::find_by_id(transaction_id.into_inner())
            .one(&self.db)
            .await?
            .map(to_record)
            .transpose()
    }

    /// Lists a user's records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, LedgerError> {
        let query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.into_inner()));

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        let records = rows
            .into_iter()
            .map(to_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse::new(records, page, total))
    }
}

async fn load_user<C: sea_orm::ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<users::Model, LedgerError> {
    users::Entity::find_by_id(user_id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| TransferError::UserNotFound(user_id).into())
}

/// Writes a new balance if the row still carries the version that was read.
pub(crate) async fn write_balance(
    txn: &DatabaseTransaction,
    user: &users::Model,
    new_balance_minor: i64,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    let result = users::Entity::update_many()
        .col_expr(users::Column::BalanceMinor, Expr::value(new_balance_minor))
        .col_expr(users::Column::Version, Expr::value(user.version + 1))
        .col_expr(users::Column::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(users::Column::Id.eq(user.id))
        .filter(users::Column::Version.eq(user.version))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(LedgerError::ConcurrentModification(user.user_id()));
    }
    Ok(())
}

/// Adds a signed delta to the balance, refusing to go below zero.
fn apply_delta(user: &users::Model, delta: i64) -> Result<i64, LedgerError> {
    let new_minor = user
        .balance_minor
        .checked_add(delta)
        .ok_or_else(|| TransferError::Validation("Amount is out of range".to_string()))?;
    if new_minor < 0 {
        return Err(TransferError::InsufficientFunds {
            required: from_minor_units(-delta),
            available: user.balance(),
        }
        .into());
    }
    Ok(new_minor)
}

fn minor_units(amount: Decimal) -> Result<i64, LedgerError> {
    to_minor_units(amount).map_err(|err| TransferError::Validation(err.to_string()).into())
}

fn parse_currency(user: &users::Model) -> Result<Currency, LedgerError> {
    user.currency()
        .map_err(|err| LedgerError::InvalidData(format!("user {}: {err}", user.id)))
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, LedgerError> {
    serde_json::to_value(value).map_err(|err| LedgerError::InvalidData(err.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(
    value: Option<serde_json::Value>,
) -> Result<Option<T>, LedgerError> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err| LedgerError::InvalidData(err.to_string()))
}

/// Converts a stored row into the domain record.
fn to_record(model: transactions::Model) -> Result<TransactionRecord, LedgerError> {
    let currency = model.currency.parse().map_err(|err| {
        LedgerError::InvalidData(format!("transaction {}: {err}", model.id))
    })?;
    Ok(TransactionRecord {
        id: TransactionId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        amount: from_minor_units(model.amount_minor),
        transaction_type: model.transaction_type.into(),
        status: model.status.into(),
        currency,
        description: model.description,
        recipient_details: from_json::<RecipientDetails>(model.recipient_details)?,
        authorization_details: from_json::<AuthorizationDetails>(model.authorization_details)?,
        related_transfer_id: model.related_transfer_id.map(TransactionId::from_uuid),
        created_at: model.created_at.to_utc(),
        completed_at: model.completed_at.map(|at| at.to_utc()),
    })
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
