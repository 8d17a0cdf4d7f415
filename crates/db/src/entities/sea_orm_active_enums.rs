//! `SeaORM` string-backed enums and their domain conversions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use meridian_core::{account, authorization, ledger};

/// Stored KYC status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum KycStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Stored authorization code type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum CodeType {
    #[sea_orm(string_value = "COT")]
    Cot,
    #[sea_orm(string_value = "IMF")]
    Imf,
    #[sea_orm(string_value = "TAX")]
    Tax,
}

/// Stored ledger record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TransactionType {
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "fee")]
    Fee,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "loan_disbursement")]
    LoanDisbursement,
    #[sea_orm(string_value = "manual_credit")]
    ManualCredit,
    #[sea_orm(string_value = "manual_debit")]
    ManualDebit,
}

/// Stored ledger record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<account::KycStatus> for KycStatus {
    fn from(status: account::KycStatus) -> Self {
        match status {
            account::KycStatus::Pending => Self::Pending,
            account::KycStatus::Submitted => Self::Submitted,
            account::KycStatus::Verified => Self::Verified,
            account::KycStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<KycStatus> for account::KycStatus {
    fn from(status: KycStatus) -> Self {
        match status {
            KycStatus::Pending => Self::Pending,
            KycStatus::Submitted => Self::Submitted,
            KycStatus::Verified => Self::Verified,
            KycStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<authorization::AuthorizationType> for CodeType {
    fn from(code_type: authorization::AuthorizationType) -> Self {
        match code_type {
            authorization::AuthorizationType::Cot => Self::Cot,
            authorization::AuthorizationType::Imf => Self::Imf,
            authorization::AuthorizationType::Tax => Self::Tax,
        }
    }
}

impl From<CodeType> for authorization::AuthorizationType {
    fn from(code_type: CodeType) -> Self {
        match code_type {
            CodeType::Cot => Self::Cot,
            CodeType::Imf => Self::Imf,
            CodeType::Tax => Self::Tax,
        }
    }
}

impl From<ledger::TransactionType> for TransactionType {
    fn from(ty: ledger::TransactionType) -> Self {
        match ty {
            ledger::TransactionType::Transfer => Self::Transfer,
            ledger::TransactionType::Fee => Self::Fee,
            ledger::TransactionType::Deposit => Self::Deposit,
            ledger::TransactionType::LoanDisbursement => Self::LoanDisbursement,
            ledger::TransactionType::ManualCredit => Self::ManualCredit,
            ledger::TransactionType::ManualDebit => Self::ManualDebit,
        }
    }
}

impl From<TransactionType> for ledger::TransactionType {
    fn from(ty: TransactionType) -> Self {
        match ty {
            TransactionType::Transfer => Self::Transfer,
            TransactionType::Fee => Self::Fee,
            TransactionType::Deposit => Self::Deposit,
            TransactionType::LoanDisbursement => Self::LoanDisbursement,
            TransactionType::ManualCredit => Self::ManualCredit,
            TransactionType::ManualDebit => Self::ManualDebit,
        }
    }
}

impl From<ledger::TransactionStatus> for TransactionStatus {
    fn from(status: ledger::TransactionStatus) -> Self {
        match status {
            ledger::TransactionStatus::Pending => Self::Pending,
            ledger::TransactionStatus::Completed => Self::Completed,
            ledger::TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<TransactionStatus> for ledger::TransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}
