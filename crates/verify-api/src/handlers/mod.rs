//! Route handlers
//!
//! Thin adapters from dispatcher calls to the verification services.

pub mod admin;
pub mod health;
pub mod verification;
