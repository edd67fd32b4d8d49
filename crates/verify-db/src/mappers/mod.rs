//! Model to entity mappers
//!
//! - `TryFrom<Model> for Entity` where stored text must be re-validated (codes, statuses)
//! - `From<Model> for Entity` otherwise
//! - `policy_with_roles` assembles a policy from its two tables

mod audit_log;
mod link;
mod pending;
mod server_config;

pub use server_config::policy_with_roles;
