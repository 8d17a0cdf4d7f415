//! Integration tests for authorization code validation and consumption.

mod common;

use chrono::Duration;
use rust_decimal_macros::dec;

use meridian_core::authorization::AuthorizationType;
use meridian_db::AuthorizationCodeRepository;
use meridian_db::repositories::authorization_code::CODE_LENGTH;
use meridian_shared::types::{AuthorizationCodeId, UserId};

#[tokio::test]
async fn test_validate_then_mark_used_then_validate() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db.clone());
    let issued = common::code(&db, "COT-4821", AuthorizationType::Cot, None).await;

    let first = repo
        .validate("COT-4821", AuthorizationType::Cot, None)
        .await
        .expect("Failed to validate");
    assert!(first.valid);
    assert_eq!(first.code_id, Some(AuthorizationCodeId::from_uuid(issued.id)));

    repo.mark_used(AuthorizationCodeId::from_uuid(issued.id))
        .await
        .expect("Failed to mark used");

    let second = repo
        .validate("COT-4821", AuthorizationType::Cot, None)
        .await
        .expect("Failed to validate");
    assert!(!second.valid);
    assert_eq!(
        second.message.as_deref(),
        Some("Invalid or already used COT code")
    );
}

#[tokio::test]
async fn test_mark_used_twice_is_a_no_op() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db.clone());
    let issued = common::code(&db, "IMF-99999", AuthorizationType::Imf, None).await;
    let id = AuthorizationCodeId::from_uuid(issued.id);

    repo.mark_used(id).await.expect("First mark_used failed");
    let used_at = repo.find_by_id(id).await.unwrap().unwrap().used_at;
    repo.mark_used(id).await.expect("Second mark_used failed");

    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.is_used);
    assert!(used_at.is_some());
    assert_eq!(stored.used_at, used_at);
}

#[tokio::test]
async fn test_mark_used_unknown_id_is_a_no_op() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db);
    assert!(repo.mark_used(AuthorizationCodeId::new()).await.is_ok());
}

#[tokio::test]
async fn test_validation_is_read_only() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db.clone());
    common::code(&db, "TAX-1", AuthorizationType::Tax, None).await;

    for _ in 0..3 {
        let result = repo
            .validate("TAX-1", AuthorizationType::Tax, None)
            .await
            .unwrap();
        assert!(result.valid);
    }
}

#[tokio::test]
async fn test_type_must_match() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db.clone());
    common::code(&db, "SHARED-1", AuthorizationType::Cot, None).await;

    let result = repo
        .validate("SHARED-1", AuthorizationType::Imf, None)
        .await
        .unwrap();
    assert!(!result.valid);
    assert_eq!(
        result.message.as_deref(),
        Some("Invalid or already used IMF code")
    );
}

#[tokio::test]
async fn test_scoped_code_needs_owner() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db.clone());
    let owner = common::verified_account(&db, dec!(0)).await;
    let stranger = common::verified_account(&db, dec!(0)).await;
    common::code(&db, "OWNED-1", AuthorizationType::Cot, Some(owner.user_id())).await;

    let mine = repo
        .validate("OWNED-1", AuthorizationType::Cot, Some(owner.user_id()))
        .await
        .unwrap();
    let theirs = repo
        .validate("OWNED-1", AuthorizationType::Cot, Some(stranger.user_id()))
        .await
        .unwrap();
    let anonymous = repo
        .validate("OWNED-1", AuthorizationType::Cot, None)
        .await
        .unwrap();

    assert!(mine.valid);
    assert!(!theirs.valid);
    assert!(!anonymous.valid);
    // Callers cannot tell a foreign code from an unknown one
    assert_eq!(theirs.message, anonymous.message);
}

#[tokio::test]
async fn test_unknown_and_blank_codes_rejected() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db);

    let unknown = repo
        .validate("NOPE", AuthorizationType::Cot, Some(UserId::new()))
        .await
        .unwrap();
    let blank = repo
        .validate("   ", AuthorizationType::Cot, None)
        .await
        .unwrap();
    assert!(!unknown.valid);
    assert_eq!(unknown.code_id, None);
    assert!(!blank.valid);
    assert_eq!(unknown.message, blank.message);
}

#[tokio::test]
async fn test_issued_codes_expire() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db);

    let expired = repo
        .issue(AuthorizationType::Cot, None, Some(Duration::seconds(-1)))
        .await
        .unwrap();
    let fresh = repo
        .issue(AuthorizationType::Cot, None, Some(Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(fresh.code.len(), CODE_LENGTH);

    assert!(
        !repo
            .validate(&expired.code, AuthorizationType::Cot, None)
            .await
            .unwrap()
            .valid
    );
    assert!(
        repo.validate(&fresh.code, AuthorizationType::Cot, None)
            .await
            .unwrap()
            .valid
    );
}

#[tokio::test]
async fn test_surrounding_whitespace_is_ignored() {
    let db = common::setup().await;
    let repo = AuthorizationCodeRepository::new(db.clone());
    common::code(&db, "PADDED", AuthorizationType::Tax, None).await;

    let result = repo
        .validate("  PADDED ", AuthorizationType::Tax, None)
        .await
        .unwrap();
    assert!(result.valid);
}
