//! Server permission bits, at the chat platform's bit positions
//!
//! Only the bits the bot checks are named. Unnamed bits from the platform
//! are retained so a combined mask round-trips exactly.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const KICK_MEMBERS     = 1 << 1;
        /// Passes every check
        const ADMINISTRATOR    = 1 << 3;
        const MANAGE_GUILD     = 1 << 5;
        const SEND_MESSAGES    = 1 << 11;
        const MANAGE_NICKNAMES = 1 << 27;
        const MANAGE_ROLES     = 1 << 28;

        const _ = !0;
    }
}

impl Permissions {
    /// `true` if `required` is granted, directly or through ADMINISTRATOR
    #[inline]
    pub fn has(&self, required: Permissions) -> bool {
        self.contains(Self::ADMINISTRATOR) || self.contains(required)
    }
}

/// The platform sends permission masks as decimal strings
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(u64),
        }

        let bits = match Wire::deserialize(deserializer)? {
            Wire::Text(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom)?,
            Wire::Number(n) => n,
        };
        Ok(Self::from_bits_retain(bits))
    }
}
