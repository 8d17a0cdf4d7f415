//! Integration tests for the ledger transaction committer.

mod common;

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, DatabaseConnection};

use meridian_core::account::KycStatus;
use meridian_core::authorization::{AuthorizationCodes, AuthorizationPolicy, AuthorizationType};
use meridian_core::ledger::{Adjustment, TransactionStatus, TransactionType};
use meridian_core::transfer::{TransferCommand, TransferError, TransferRequest};
use meridian_db::{
    AccountRepository, AuthorizationCodeRepository, LedgerError, LedgerRepository,
};
use meridian_shared::types::{
    AuthorizationCodeId, Currency, PageRequest, TransactionId, UserId,
};

fn policy(cot: bool, imf: bool, tax: bool) -> AuthorizationPolicy {
    AuthorizationPolicy {
        require_cot: cot,
        require_imf: imf,
        require_tax: tax,
        imf_min_length: 5,
    }
}

fn command(user_id: UserId, amount: Decimal, codes: &[(AuthorizationType, &str)]) -> TransferCommand {
    let mut authorizations = AuthorizationCodes::default();
    for (step, code) in codes {
        authorizations.set(*step, *code);
    }
    let mut request = TransferRequest::new("John Recipient", amount);
    request.recipient_account = Some("0123456789".to_string());
    request.recipient_bank = Some("First Bank".to_string());
    TransferCommand {
        user_id,
        request,
        authorizations,
        fee_override: None,
    }
}

async fn balance_of(db: &DatabaseConnection, user_id: UserId) -> Decimal {
    AccountRepository::new(db.clone())
        .find_by_id(user_id)
        .await
        .expect("Failed to load account")
        .expect("Account should exist")
        .balance()
}

async fn record_count(repo: &LedgerRepository, user_id: UserId) -> u64 {
    repo.list_for_user(user_id, &PageRequest::default())
        .await
        .expect("Failed to list records")
        .meta
        .total
}

async fn is_used(db: &DatabaseConnection, id: uuid::Uuid) -> bool {
    AuthorizationCodeRepository::new(db.clone())
        .find_by_id(AuthorizationCodeId::from_uuid(id))
        .await
        .unwrap()
        .unwrap()
        .is_used
}

#[tokio::test]
async fn test_end_to_end_transfer() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(500.00)).await;
    let cot = common::code(&db, "COT-500", AuthorizationType::Cot, Some(user.user_id())).await;
    let imf = common::code(&db, "IMF-12345", AuthorizationType::Imf, None).await;

    let receipt = repo
        .commit_transfer(
            &command(
                user.user_id(),
                dec!(200.00),
                &[
                    (AuthorizationType::Cot, "COT-500"),
                    (AuthorizationType::Imf, "IMF-12345"),
                ],
            ),
            &policy(true, true, false),
            None,
        )
        .await
        .expect("Transfer should commit");

    assert_eq!(receipt.quote.fee, dec!(2.00));
    assert_eq!(receipt.new_balance, dec!(298.00));
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(298.00));
    assert_eq!(receipt.consumed_codes.len(), 2);
    assert!(is_used(&db, cot.id).await);
    assert!(is_used(&db, imf.id).await);

    let history = repo
        .list_for_user(user.user_id(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(history.meta.total, 2);

    let transfer = repo
        .find_transaction(receipt.transaction_id)
        .await
        .unwrap()
        .expect("Transfer record should exist");
    assert_eq!(transfer.amount, dec!(-200.00));
    assert_eq!(transfer.transaction_type, TransactionType::Transfer);
    assert_eq!(transfer.status, TransactionStatus::Completed);
    let recipient = transfer.recipient_details.expect("Recipient details");
    assert_eq!(recipient.name, "John Recipient");
    assert_eq!(recipient.bank_name.as_deref(), Some("First Bank"));
    let audit = transfer.authorization_details.expect("Authorization details");
    assert_eq!(audit.cot_code.as_deref(), Some("COT-500"));
    assert_eq!(audit.imf_code.as_deref(), Some("IMF-12345"));
    assert_eq!(audit.tax_code, None);

    let fee_id = receipt.fee_transaction_id.expect("Fee record id");
    let fee = repo.find_transaction(fee_id).await.unwrap().unwrap();
    assert_eq!(fee.amount, dec!(-2.00));
    assert_eq!(fee.transaction_type, TransactionType::Fee);
    assert_eq!(fee.related_transfer_id, Some(transfer.id));
    assert_eq!(fee.currency, transfer.currency);
    assert_eq!(fee.currency, Currency::Usd);
}

#[tokio::test]
async fn test_codes_cannot_be_reused() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(500)).await;
    common::code(&db, "ONCE-ONLY", AuthorizationType::Cot, None).await;
    let cmd = command(user.user_id(), dec!(10), &[(AuthorizationType::Cot, "ONCE-ONLY")]);

    repo.commit_transfer(&cmd, &policy(true, false, false), None)
        .await
        .expect("First use should commit");
    let err = repo
        .commit_transfer(&cmd, &policy(true, false, false), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Rule(TransferError::InvalidAuthorizationCode(AuthorizationType::Cot))
    ));
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(489.90));
    assert_eq!(record_count(&repo, user.user_id()).await, 2);
}

#[tokio::test]
async fn test_insufficient_funds_leaves_everything_untouched() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100.00)).await;
    let cot = common::code(&db, "COT-1", AuthorizationType::Cot, None).await;

    let err = repo
        .commit_transfer(
            &command(user.user_id(), dec!(100.00), &[(AuthorizationType::Cot, "COT-1")]),
            &policy(true, false, false),
            Some(dec!(0.01)),
        )
        .await
        .unwrap_err();

    match err {
        LedgerError::Rule(TransferError::InsufficientFunds {
            required,
            available,
        }) => {
            assert_eq!(required, dec!(101.00));
            assert_eq!(available, dec!(100.00));
        }
        other => panic!("Expected InsufficientFunds, got {other:?}"),
    }
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(100.00));
    assert_eq!(record_count(&repo, user.user_id()).await, 0);
    assert!(!is_used(&db, cot.id).await);
}

#[tokio::test]
async fn test_kyc_gate_blocks_every_amount() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());

    for status in [KycStatus::Pending, KycStatus::Submitted, KycStatus::Rejected] {
        let user = common::account_with(&db, dec!(1000), status).await;
        for amount in [dec!(0), dec!(0.01), dec!(50), dec!(5000)] {
            let err = repo
                .commit_transfer(
                    &command(user.user_id(), amount, &[]),
                    &AuthorizationPolicy::none(),
                    None,
                )
                .await
                .unwrap_err();
            assert!(
                matches!(err, LedgerError::Rule(TransferError::KycNotVerified)),
                "status {status}, amount {amount}: {err:?}"
            );
            assert_eq!(
                err.user_message(),
                "Please complete KYC verification before making transfers"
            );
        }
        assert_eq!(balance_of(&db, user.user_id()).await, dec!(1000));
    }
}

#[tokio::test]
async fn test_verified_after_kyc_update() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::account_with(&db, dec!(100), KycStatus::Submitted).await;

    AccountRepository::new(db.clone())
        .set_kyc_status(user.user_id(), KycStatus::Verified)
        .await
        .expect("Failed to verify account");

    let receipt = repo
        .commit_transfer(
            &command(user.user_id(), dec!(10), &[]),
            &AuthorizationPolicy::none(),
            Some(Decimal::ZERO),
        )
        .await
        .expect("Transfer should commit");
    assert_eq!(receipt.new_balance, dec!(90));
}

#[tokio::test]
async fn test_only_imf_required() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;
    common::code(&db, "IMF-54321", AuthorizationType::Imf, None).await;

    let receipt = repo
        .commit_transfer(
            &command(user.user_id(), dec!(10), &[(AuthorizationType::Imf, "IMF-54321")]),
            &policy(false, true, false),
            None,
        )
        .await
        .expect("Only the IMF code should be needed");
    assert_eq!(receipt.consumed_codes.len(), 1);
}

#[tokio::test]
async fn test_codes_for_disabled_steps_are_not_checked() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;

    let receipt = repo
        .commit_transfer(
            &command(user.user_id(), dec!(10), &[(AuthorizationType::Tax, "NOT-ISSUED")]),
            &policy(false, false, false),
            None,
        )
        .await
        .expect("Disabled steps should be skipped");
    assert!(receipt.consumed_codes.is_empty());
}

#[tokio::test]
async fn test_missing_code_for_enabled_step() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;
    common::code(&db, "IMF-54321", AuthorizationType::Imf, None).await;

    let err = repo
        .commit_transfer(
            &command(user.user_id(), dec!(10), &[(AuthorizationType::Imf, "IMF-54321")]),
            &policy(true, true, false),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(TransferError::MissingAuthorizationCode(AuthorizationType::Cot))
    ));
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(100));
}

#[tokio::test]
async fn test_invalid_code_reports_failed_step() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;
    let cot = common::code(&db, "COT-OK", AuthorizationType::Cot, None).await;

    let err = repo
        .commit_transfer(
            &command(
                user.user_id(),
                dec!(10),
                &[
                    (AuthorizationType::Cot, "COT-OK"),
                    (AuthorizationType::Imf, "WRONG-IMF"),
                ],
            ),
            &policy(true, true, false),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(TransferError::InvalidAuthorizationCode(AuthorizationType::Imf))
    ));
    assert_eq!(err.user_message(), "Invalid or already used IMF code");
    assert!(!is_used(&db, cot.id).await);
}

#[tokio::test]
async fn test_failed_record_write_rolls_back_balance() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(500)).await;
    let cot = common::code(&db, "COT-ATOMIC", AuthorizationType::Cot, None).await;

    // The balance update succeeds, the record insert then fails
    db.execute_unprepared("DROP TABLE transactions")
        .await
        .expect("Failed to drop table");

    let err = repo
        .commit_transfer(
            &command(user.user_id(), dec!(200), &[(AuthorizationType::Cot, "COT-ATOMIC")]),
            &policy(true, false, false),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Database(_)));
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(500));
    assert!(!is_used(&db, cot.id).await);
}

#[tokio::test]
async fn test_zero_fee_writes_single_record() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;

    let mut cmd = command(user.user_id(), dec!(100), &[]);
    cmd.fee_override = Some(Decimal::ZERO);
    let receipt = repo
        .commit_transfer(&cmd, &AuthorizationPolicy::none(), Some(dec!(0.05)))
        .await
        .expect("Transfer should commit");

    assert_eq!(receipt.fee_transaction_id, None);
    assert_eq!(receipt.new_balance, dec!(0));
    assert_eq!(record_count(&repo, user.user_id()).await, 1);
}

#[tokio::test]
async fn test_platform_fee_rate_applies_without_override() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(1000)).await;

    let receipt = repo
        .commit_transfer(
            &command(user.user_id(), dec!(333.33), &[]),
            &AuthorizationPolicy::none(),
            Some(dec!(0.015)),
        )
        .await
        .unwrap();
    // 333.33 * 0.015 = 4.99995 -> 5.00
    assert_eq!(receipt.quote.fee, dec!(5.00));
    assert_eq!(receipt.new_balance, dec!(661.67));
}

#[tokio::test]
async fn test_rejects_bad_input_before_writing() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;

    let mut bad_fee = command(user.user_id(), dec!(10), &[]);
    bad_fee.fee_override = Some(dec!(1.5));
    let err = repo
        .commit_transfer(&bad_fee, &AuthorizationPolicy::none(), None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let err = repo
        .commit_transfer(
            &command(user.user_id(), dec!(-10), &[]),
            &AuthorizationPolicy::none(),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(100));
}

#[tokio::test]
async fn test_unknown_user() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db);
    let missing = UserId::new();

    let err = repo
        .commit_transfer(
            &command(missing, dec!(10), &[]),
            &AuthorizationPolicy::none(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(TransferError::UserNotFound(id)) if id == missing
    ));
}

#[tokio::test]
async fn test_concurrent_transfers_do_not_lose_updates() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;

    let commands: Vec<_> = (0..5)
        .map(|_| {
            let mut cmd = command(user.user_id(), dec!(10), &[]);
            cmd.fee_override = Some(Decimal::ZERO);
            cmd
        })
        .collect();
    let policy = AuthorizationPolicy::none();
    let results = futures::future::join_all(
        commands
            .iter()
            .map(|cmd| repo.commit_transfer(cmd, &policy, None)),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(50));
    assert_eq!(record_count(&repo, user.user_id()).await, 5);
}

#[tokio::test]
async fn test_concurrent_commits_share_one_code() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(100)).await;
    common::code(&db, "RACE-1", AuthorizationType::Cot, None).await;
    let cmd = command(user.user_id(), dec!(10), &[(AuthorizationType::Cot, "RACE-1")]);
    let policy = policy(true, false, false);

    let (first, second) = tokio::join!(
        repo.commit_transfer(&cmd, &policy, Some(Decimal::ZERO)),
        repo.commit_transfer(&cmd, &policy, Some(Decimal::ZERO)),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(90));
}

#[tokio::test]
async fn test_pending_deposit_completion() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(10)).await;

    let pending = repo
        .record_pending_deposit(user.user_id(), dec!(25.50), "Wire from employer")
        .await
        .expect("Failed to record deposit");
    assert_eq!(pending.status, TransactionStatus::Pending);
    assert_eq!(pending.completed_at, None);
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(10));

    let change = repo
        .complete_pending(pending.id)
        .await
        .expect("Failed to complete deposit");
    assert_eq!(change.new_balance, dec!(35.50));
    assert_eq!(change.record.status, TransactionStatus::Completed);
    assert!(change.record.completed_at.is_some());
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(35.50));

    let err = repo.complete_pending(pending.id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(TransferError::TransactionNotPending(id)) if id == pending.id
    ));
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(35.50));

    let missing = TransactionId::new();
    let err = repo.complete_pending(missing).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(TransferError::TransactionNotFound(id)) if id == missing
    ));

    let err = repo
        .record_pending_deposit(user.user_id(), dec!(1.005), "Sub-cent wire")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Rule(TransferError::Validation(_))));
    assert_eq!(record_count(&repo, user.user_id()).await, 1);
}

#[tokio::test]
async fn test_adjustments() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(20)).await;

    let credit = repo
        .apply_adjustment(user.user_id(), &Adjustment::credit(dec!(30), "Promotional credit"))
        .await
        .unwrap();
    assert_eq!(credit.new_balance, dec!(50));
    assert_eq!(credit.record.amount, dec!(30));
    assert_eq!(credit.record.transaction_type, TransactionType::ManualCredit);
    assert_eq!(credit.holder.name, "Jane Holder");

    let debit = repo
        .apply_adjustment(user.user_id(), &Adjustment::debit(dec!(45), "Chargeback"))
        .await
        .unwrap();
    assert_eq!(debit.new_balance, dec!(5));
    assert_eq!(debit.record.amount, dec!(-45));
    assert_eq!(debit.record.transaction_type, TransactionType::ManualDebit);

    let err = repo
        .apply_adjustment(user.user_id(), &Adjustment::debit(dec!(6), "Too much"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");

    let err = repo
        .apply_adjustment(user.user_id(), &Adjustment::credit(dec!(0), "Nothing"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let err = repo
        .apply_adjustment(user.user_id(), &Adjustment::credit(dec!(1.005), "Sub-cent"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert_eq!(err.user_message(), "Amount may have at most 2 decimal places");
    assert_eq!(balance_of(&db, user.user_id()).await, dec!(5));
}

#[tokio::test]
async fn test_history_is_paginated_per_user() {
    let db = common::setup().await;
    let repo = LedgerRepository::new(db.clone());
    let user = common::verified_account(&db, dec!(0)).await;
    let other = common::verified_account(&db, dec!(0)).await;

    for n in 1..=3 {
        repo.apply_adjustment(user.user_id(), &Adjustment::credit(Decimal::from(n), "Top-up"))
            .await
            .unwrap();
    }
    repo.apply_adjustment(other.user_id(), &Adjustment::credit(dec!(1), "Top-up"))
        .await
        .unwrap();

    let first = repo
        .list_for_user(user.user_id(), &PageRequest::new(1, 2))
        .await
        .unwrap();
    let second = repo
        .list_for_user(user.user_id(), &PageRequest::new(2, 2))
        .await
        .unwrap();

    assert_eq!(first.meta.total, 3);
    assert_eq!(first.meta.total_pages, 2);
    assert_eq!(first.data.len(), 2);
    assert_eq!(second.data.len(), 1);

    let ids: HashSet<_> = first.data.iter().chain(&second.data).map(|r| r.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(
        first
            .data
            .iter()
            .chain(&second.data)
            .all(|r| r.user_id == user.user_id())
    );
}
