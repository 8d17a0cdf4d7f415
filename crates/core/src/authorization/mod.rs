//! Authorization steps and one-time code rules.
//!
//! A transfer may pass up to three steps (COT, IMF, Tax), each collecting one
//! code. Which steps run is decided by an [`AuthorizationPolicy`].

pub mod code;
pub mod types;

pub use code::{CodeRecord, CodeValidation, rejection_message};
pub use types::{AuthorizationCodes, AuthorizationPolicy, AuthorizationType};
