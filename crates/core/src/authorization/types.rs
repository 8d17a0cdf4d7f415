//! Authorization step types, policy flags and collected codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use meridian_shared::TransferConfig;

/// The kind of one-time code a transfer step asks for.
///
/// Steps always run in the order of [`AuthorizationType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorizationType {
    /// Cost of Transfer.
    Cot,
    /// IMF authorization.
    Imf,
    /// Tax clearance.
    Tax,
}

impl AuthorizationType {
    /// Every step, in presentation order.
    pub const ALL: [Self; 3] = [Self::Cot, Self::Imf, Self::Tax];

    /// Returns the stored code, e.g. `"COT"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cot => "COT",
            Self::Imf => "IMF",
            Self::Tax => "TAX",
        }
    }

    /// Human-readable step name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cot => "Cost of Transfer",
            Self::Imf => "IMF authorization",
            Self::Tax => "Tax clearance",
        }
    }

    /// Parses a stored code, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "COT" => Some(Self::Cot),
            "IMF" => Some(Self::Imf),
            "TAX" => Some(Self::Tax),
            _ => None,
        }
    }
}

impl fmt::Display for AuthorizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which authorization steps a transfer must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationPolicy {
    /// Ask for a Cost-of-Transfer code.
    pub require_cot: bool,
    /// Ask for an IMF code.
    pub require_imf: bool,
    /// Ask for a tax clearance code.
    pub require_tax: bool,
    /// Minimum accepted length of an IMF code.
    pub imf_min_length: usize,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for AuthorizationPolicy {
    fn from(config: &TransferConfig) -> Self {
        Self {
            require_cot: config.require_cot,
            require_imf: config.require_imf,
            require_tax: config.require_tax,
            imf_min_length: config.imf_min_length,
        }
    }
}

impl AuthorizationPolicy {
    /// A policy with every step disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            require_cot: false,
            require_imf: false,
            require_tax: false,
            imf_min_length: 0,
        }
    }

    /// Returns true if the given step is enabled.
    #[must_use]
    pub const fn requires(&self, step: AuthorizationType) -> bool {
        match step {
            AuthorizationType::Cot => self.require_cot,
            AuthorizationType::Imf => self.require_imf,
            AuthorizationType::Tax => self.require_tax,
        }
    }

    /// Enabled steps in presentation order.
    #[must_use]
    pub fn enabled_steps(&self) -> Vec<AuthorizationType> {
        AuthorizationType::ALL
            .into_iter()
            .filter(|step| self.requires(*step))
            .collect()
    }

    /// The first enabled step strictly after `current`, or the first enabled
    /// step overall when `current` is `None`.
    #[must_use]
    pub fn next_step(&self, current: Option<AuthorizationType>) -> Option<AuthorizationType> {
        AuthorizationType::ALL
            .into_iter()
            .filter(|step| current.is_none_or(|c| *step > c))
            .find(|step| self.requires(*step))
    }
}

/// Codes collected from the user, one slot per step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodes {
    /// Cost-of-Transfer code.
    #[serde(default)]
    pub cot_code: Option<String>,
    /// IMF code.
    #[serde(default)]
    pub imf_code: Option<String>,
    /// Tax clearance code.
    #[serde(default)]
    pub tax_code: Option<String>,
}

impl AuthorizationCodes {
    /// Returns the trimmed code for a step, if one was supplied.
    #[must_use]
    pub fn get(&self, step: AuthorizationType) -> Option<&str> {
        let slot = match step {
            AuthorizationType::Cot => &self.cot_code,
            AuthorizationType::Imf => &self.imf_code,
            AuthorizationType::Tax => &self.tax_code,
        };
        slot.as_deref().map(str::trim).filter(|code| !code.is_empty())
    }

    /// Stores the code for a step.
    pub fn set(&mut self, step: AuthorizationType, code: impl Into<String>) {
        let code = Some(code.into());
        match step {
            AuthorizationType::Cot => self.cot_code = code,
            AuthorizationType::Imf => self.imf_code = code,
            AuthorizationType::Tax => self.tax_code = code,
        }
    }

    /// Forgets every collected code.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Non-empty codes with their step, in presentation order.
    #[must_use]
    pub fn supplied(&self) -> Vec<(AuthorizationType, &str)> {
        AuthorizationType::ALL
            .into_iter()
            .filter_map(|step| self.get(step).map(|code| (step, code)))
            .collect()
    }
}
