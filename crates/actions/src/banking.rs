//! Banking actions.
//!
//! Every action returns an outcome value, never an `Err`. Internal error
//! details are logged here and replaced by a user-facing message.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use meridian_core::authorization::{
    AuthorizationCodes, AuthorizationPolicy, AuthorizationType, CodeValidation,
};
use meridian_core::ledger::{Adjustment, AdjustmentKind, TransactionRecord};
use meridian_core::notification::Notification;
use meridian_core::transfer::{TransferCommand, TransferRequest};
use meridian_db::{
    AuthorizationCodeRepository, BalanceChange, LedgerError, LedgerRepository, TransferReceipt,
};
use meridian_shared::types::{AuthorizationCodeId, PageRequest, PageResponse, TransactionId, UserId};
use meridian_shared::{AppConfig, AppError, EmailService, TransferConfig};

use crate::notifier::NotificationQueue;
use crate::outcome::{ActionOutcome, BalanceUpdate, Reported, TransferOutcome};

/// Entry point for transfer, code and adjustment actions.
#[derive(Clone)]
pub struct BankingActions {
    ledger: LedgerRepository,
    codes: AuthorizationCodeRepository,
    settings: TransferConfig,
    notifier: NotificationQueue,
}

impl BankingActions {
    /// Creates the action set over one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: TransferConfig, notifier: NotificationQueue) -> Self {
        Self {
            ledger: LedgerRepository::new(db.clone()).with_max_attempts(settings.max_commit_attempts),
            codes: AuthorizationCodeRepository::new(db),
            settings,
            notifier,
        }
    }

    /// Builds the production action set: SMTP alerts through a queue sized
    /// from `notifications.queue_capacity`.
    ///
    /// Must be called inside a Tokio runtime. The returned handle belongs to
    /// the delivery worker.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &AppConfig) -> (Self, JoinHandle<()>) {
        let mailer = Arc::new(EmailService::new(config.email.clone()));
        let (notifier, worker) =
            NotificationQueue::spawn(mailer, config.notifications.queue_capacity);
        info!(
            smtp_host = %config.email.smtp_host,
            queue_capacity = config.notifications.queue_capacity,
            "Banking actions ready"
        );
        (Self::new(db, config.transfer.clone(), notifier), worker)
    }

    /// Which authorization steps a transfer currently requires.
    #[must_use]
    pub fn transfer_policy(&self) -> AuthorizationPolicy {
        AuthorizationPolicy::from(&self.settings)
    }

    /// Checks a code without consuming it.
    pub async fn validate_authorization_code(
        &self,
        code: &str,
        code_type: AuthorizationType,
        user_id: Option<UserId>,
    ) -> CodeValidation {
        match self.codes.validate(code, code_type, user_id).await {
            Ok(validation) => validation,
            Err(e) => {
                error!(error = %e, code_type = %code_type, "Failed to validate authorization code");
                CodeValidation::rejected(code_type)
            }
        }
    }

    /// Marks a code as used. Already-used and unknown codes are accepted.
    pub async fn mark_authorization_code_used(
        &self,
        code_id: AuthorizationCodeId,
    ) -> ActionOutcome<()> {
        match self.codes.mark_used(code_id).await {
            Ok(()) => ActionOutcome::ok("Authorization code marked as used", ()),
            Err(e) => db_failure("mark_authorization_code_used", &e),
        }
    }

    /// Commits a transfer and queues the debit alert.
    ///
    /// The policy and platform fee rate are re-read from settings on every
    /// call; steps the client claims to have completed are not trusted.
    pub async fn commit_transfer(
        &self,
        user_id: UserId,
        request: TransferRequest,
        authorizations: AuthorizationCodes,
        fee_override: Option<Decimal>,
    ) -> Reported<TransferOutcome> {
        let command = TransferCommand {
            user_id,
            request,
            authorizations,
            fee_override,
        };
        let policy = self.transfer_policy();

        match self
            .ledger
            .commit_transfer(&command, &policy, self.settings.fee_rate)
            .await
        {
            Ok(receipt) => {
                let message = format!(
                    "Transfer of {} {:.2} to {} completed successfully",
                    receipt.currency, receipt.quote.amount, receipt.recipient_name
                );
                let outcome =
                    TransferOutcome::committed(message, receipt.new_balance, receipt.transaction_id);
                let delivery = self.notifier.enqueue(debit_alert(receipt));
                Reported {
                    outcome,
                    delivery: Some(delivery),
                }
            }
            Err(err) => {
                let (code, message) = ledger_failure("commit_transfer", err);
                Reported::silent(TransferOutcome::failed(code, message))
            }
        }
    }

    /// Credits an account and queues the credit alert.
    pub async fn credit_account(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> Reported<ActionOutcome<BalanceUpdate>> {
        self.adjust("credit_account", user_id, Adjustment::credit(amount, description))
            .await
    }

    /// Debits an account and queues the debit alert. The balance may not
    /// go below zero.
    pub async fn debit_account(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> Reported<ActionOutcome<BalanceUpdate>> {
        self.adjust("debit_account", user_id, Adjustment::debit(amount, description))
            .await
    }

    async fn adjust(
        &self,
        action: &'static str,
        user_id: UserId,
        adjustment: Adjustment,
    ) -> Reported<ActionOutcome<BalanceUpdate>> {
        match self.ledger.apply_adjustment(user_id, &adjustment).await {
            Ok(change) => {
                let verb = match adjustment.kind {
                    AdjustmentKind::Credit => "credited",
                    AdjustmentKind::Debit => "debited",
                };
                let message = format!(
                    "Account {verb} with {} {:.2}",
                    change.record.currency, adjustment.amount
                );
                let update = balance_update(&change);
                let alert = match adjustment.kind {
                    AdjustmentKind::Credit => Notification::AccountCredit {
                        to: change.holder,
                        amount: adjustment.amount,
                        currency: change.record.currency,
                        description: adjustment.description,
                        new_balance: change.new_balance,
                        transaction_id: change.record.id,
                    },
                    AdjustmentKind::Debit => Notification::AccountDebit {
                        to: change.holder,
                        amount: adjustment.amount,
                        currency: change.record.currency,
                        description: adjustment.description,
                        new_balance: change.new_balance,
                        transaction_id: change.record.id,
                    },
                };
                Reported {
                    outcome: ActionOutcome::ok(message, update),
                    delivery: Some(self.notifier.enqueue(alert)),
                }
            }
            Err(err) => {
                let (code, message) = ledger_failure(action, err);
                Reported::silent(ActionOutcome::failed(code, message))
            }
        }
    }

    /// Records an incoming deposit as pending. The balance is unchanged
    /// until the deposit is completed.
    pub async fn record_pending_deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> ActionOutcome<TransactionRecord> {
        match self
            .ledger
            .record_pending_deposit(user_id, amount, description)
            .await
        {
            Ok(record) => ActionOutcome::ok("Deposit recorded as pending", record),
            Err(err) => {
                let (code, message) = ledger_failure("record_pending_deposit", err);
                ActionOutcome::failed(code, message)
            }
        }
    }

    /// Completes a pending record, applies it to the balance and queues
    /// the completion alert.
    pub async fn complete_pending_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Reported<ActionOutcome<BalanceUpdate>> {
        match self.ledger.complete_pending(transaction_id).await {
            Ok(change) => {
                let update = balance_update(&change);
                let alert = Notification::TransactionCompleted {
                    to: change.holder,
                    amount: change.record.amount,
                    currency: change.record.currency,
                    transaction_type: change.record.transaction_type,
                    transaction_id: change.record.id,
                };
                Reported {
                    outcome: ActionOutcome::ok("Transaction completed", update),
                    delivery: Some(self.notifier.enqueue(alert)),
                }
            }
            Err(err) => {
                let (code, message) = ledger_failure("complete_pending_transaction", err);
                Reported::silent(ActionOutcome::failed(code, message))
            }
        }
    }

    /// A user's ledger records, newest first.
    pub async fn transaction_history(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> ActionOutcome<PageResponse<TransactionRecord>> {
        match self.ledger.list_for_user(user_id, page).await {
            Ok(records) => ActionOutcome::ok("Transactions loaded", records),
            Err(err) => {
                let (code, message) = ledger_failure("transaction_history", err);
                ActionOutcome::failed(code, message)
            }
        }
    }
}

fn debit_alert(receipt: TransferReceipt) -> Notification {
    Notification::TransferDebit {
        to: receipt.holder,
        amount: receipt.quote.amount,
        fee: receipt.quote.fee,
        currency: receipt.currency,
        recipient_name: receipt.recipient_name,
        new_balance: receipt.new_balance,
        transaction_id: receipt.transaction_id,
    }
}

fn balance_update(change: &BalanceChange) -> BalanceUpdate {
    BalanceUpdate {
        transaction_id: change.record.id,
        new_balance: change.new_balance,
        currency: change.record.currency,
    }
}

/// Logs a ledger error and returns its code and user-facing message.
fn ledger_failure(action: &'static str, err: LedgerError) -> (&'static str, String) {
    let code = err.error_code();
    let message = err.user_message();
    let err = AppError::from(err);
    if err.is_internal() {
        error!(action, error = %err, "Action failed");
    } else if matches!(err, AppError::Conflict(_)) {
        warn!(action, error = %err, "Action gave up after conflicts");
    } else {
        info!(action, error = %err, "Action rejected");
    }
    (code, message)
}

fn db_failure<T>(action: &'static str, err: &DbErr) -> ActionOutcome<T> {
    let err = AppError::Database(err.to_string());
    error!(action, error = %err, "Action failed");
    ActionOutcome::failed(
        err.error_code(),
        "An unexpected error occurred, please try again later".to_string(),
    )
}
