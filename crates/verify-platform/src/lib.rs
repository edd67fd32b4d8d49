//! # verify-platform
//!
//! `reqwest`-based implementations of the outbound ports defined in verify-core:
//!
//! - [`DiscordClient`] implements `ChatPlatform` over the Discord REST API
//! - [`RobloxDirectory`] implements `IdentityDirectory` over the public Roblox web APIs
//!
//! Every request carries a bounded timeout and is never retried here.

mod discord;
mod http;
mod roblox;

pub use discord::DiscordClient;
pub use http::HttpSettings;
pub use roblox::RobloxDirectory;
