//! Axum extractors for request handling
//!
//! Custom extractors for the dispatcher identity, path ids and validated bodies.

mod actor;
mod path;
mod validated;

pub use actor::{Actor, ACTOR_HEADER};
pub use path::{ServerPath, ServerRolePath, ServerUserPath};
pub use validated::{OptionalValidatedJson, ValidatedJson, ValidatedQuery};
