//! Account holder state relevant to money movement.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity verification status of an account holder.
///
/// Only [`KycStatus::Verified`] accounts may send transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    /// Nothing submitted yet.
    Pending,
    /// Documents submitted, awaiting review.
    Submitted,
    /// Identity confirmed.
    Verified,
    /// Review failed.
    Rejected,
}

impl KycStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "submitted" => Some(Self::Submitted),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the holder may move money out of the account.
    #[must_use]
    pub const fn permits_transfers(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
