//! Rules deciding whether a stored authorization code may be used.
//!
//! The persistence layer loads candidate records and defers the decision to
//! [`CodeRecord::is_usable_by`], so the rule is testable without a database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meridian_shared::types::{AuthorizationCodeId, UserId};

use super::types::AuthorizationType;

/// The fields of an issued code that matter for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    /// Record identifier.
    pub id: AuthorizationCodeId,
    /// Step the code belongs to.
    pub code_type: AuthorizationType,
    /// Owner, if the code was issued to one user.
    pub user_id: Option<UserId>,
    /// Whether the code was already consumed.
    pub is_used: bool,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CodeRecord {
    /// Returns true if `caller` may consume this code at `now`.
    ///
    /// A scoped code needs a matching caller. Expiry only applies when the
    /// record carries one.
    #[must_use]
    pub fn is_usable_by(&self, caller: Option<UserId>, now: DateTime<Utc>) -> bool {
        if self.is_used {
            return false;
        }
        if let Some(owner) = self.user_id
            && caller != Some(owner)
        {
            return false;
        }
        self.expires_at.is_none_or(|expiry| now < expiry)
    }
}

/// Result of validating a submitted code.
///
/// Rejections carry one generic message so callers cannot tell a missing code
/// from a used, expired or foreign one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeValidation {
    /// Whether the code may be consumed.
    pub valid: bool,
    /// Identifier of the matching record when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_id: Option<AuthorizationCodeId>,
    /// Human-readable reason when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CodeValidation {
    /// A successful validation.
    #[must_use]
    pub const fn accepted(code_id: AuthorizationCodeId) -> Self {
        Self {
            valid: true,
            code_id: Some(code_id),
            message: None,
        }
    }

    /// A failed validation for the given step.
    #[must_use]
    pub fn rejected(code_type: AuthorizationType) -> Self {
        Self {
            valid: false,
            code_id: None,
            message: Some(rejection_message(code_type)),
        }
    }
}

/// The single message shown for any unusable code.
#[must_use]
pub fn rejection_message(code_type: AuthorizationType) -> String {
    format!("Invalid or already used {code_type} code")
}
