//! # verify-api
//!
//! HTTP trigger the command dispatcher calls, built with Axum.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, run};
pub use state::AppState;
