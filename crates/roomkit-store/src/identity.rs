use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomkit_core::IdentityId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAddress {
    pub channel_type: String,
    pub address: String,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: Option<String>,
    pub external_id: Option<String>,
    pub channel_addresses: Vec<ChannelAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: IdentityId::generate(),
            display_name: None,
            external_id: None,
            channel_addresses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches(&self, channel_type: &str, address: &str) -> bool {
        self.channel_addresses
            .iter()
            .any(|a| a.channel_type == channel_type && a.address == address)
    }
}
