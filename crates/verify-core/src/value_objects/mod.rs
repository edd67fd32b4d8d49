//! Value objects - immutable types that represent domain concepts

mod permissions;
mod session_credential;
mod snowflake;
mod verification_code;

pub use permissions::Permissions;
pub use session_credential::SessionCredential;
pub use snowflake::{Snowflake, SnowflakeParseError};
pub use verification_code::{normalize_for_match, CodeParseError, VerificationCode};
