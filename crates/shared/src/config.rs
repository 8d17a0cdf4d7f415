//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// SMTP configuration for notification emails.
    #[serde(default)]
    pub email: EmailConfig,
    /// Transfer policy and fee configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Notification queue configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Email (SMTP) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "alerts@meridian.local".to_string()
}

fn default_from_name() -> String {
    "Meridian Bank".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

/// Transfer policy flags and fee settings.
///
/// The three `require_*` flags decide which authorization steps a transfer
/// must pass, in the fixed order COT, IMF, Tax.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Require a Cost-of-Transfer code.
    #[serde(default = "default_true")]
    pub require_cot: bool,
    /// Require an IMF authorization code.
    #[serde(default = "default_true")]
    pub require_imf: bool,
    /// Require a tax clearance code.
    #[serde(default)]
    pub require_tax: bool,
    /// Minimum length of an IMF code.
    #[serde(default = "default_imf_min_length")]
    pub imf_min_length: usize,
    /// Platform fee rate as a fraction of the amount (0.01 = 1%).
    #[serde(default)]
    pub fee_rate: Option<Decimal>,
    /// How many times a ledger commit is attempted on write conflicts.
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
}

fn default_true() -> bool {
    true
}

fn default_imf_min_length() -> usize {
    5
}

fn default_max_commit_attempts() -> u32 {
    5
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            require_cot: true,
            require_imf: true,
            require_tax: false,
            imf_min_length: default_imf_min_length(),
            fee_rate: None,
            max_commit_attempts: default_max_commit_attempts(),
        }
    }
}

/// Notification queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Number of notifications buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
