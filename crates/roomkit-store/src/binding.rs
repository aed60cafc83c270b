use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomkit_core::{ChannelId, ParticipantId, RoomId};

use crate::event::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Transport,
    Intelligence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingDirection {
    Inbound,
    Outbound,
    Bidirectional,
}

impl BindingDirection {
    pub fn allows(&self, direction: Direction) -> bool {
        match (self, direction) {
            (BindingDirection::Bidirectional, _) => true,
            (BindingDirection::Inbound, Direction::Inbound) => true,
            (BindingDirection::Outbound, Direction::Outbound) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
    None,
}

impl Access {
    pub fn can_read(&self) -> bool {
        matches!(self, Access::ReadWrite | Access::ReadOnly)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Access::ReadWrite | Access::WriteOnly)
    }
}

/// Media types, size limits, and feature flags a channel adapter declares it
/// can render — consulted by the transcoder to decide whether content must
/// be downgraded for this binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlengthPolicy {
    Truncate,
    Reject,
}

impl Default for OverlengthPolicy {
    fn default() -> Self {
        OverlengthPolicy::Truncate
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_text: bool,
    pub supports_rich: bool,
    pub supports_media: bool,
    pub supports_location: bool,
    pub supports_audio: bool,
    pub supports_video: bool,
    pub supports_template: bool,
    pub max_length: Option<usize>,
    #[serde(default)]
    pub on_overlength: OverlengthPolicy,
}

impl Capabilities {
    /// Plain text is the universal fallback every binding must accept.
    pub fn text_only() -> Self {
        Self {
            supports_text: true,
            ..Default::default()
        }
    }

    pub fn all() -> Self {
        Self {
            supports_text: true,
            supports_rich: true,
            supports_media: true,
            supports_location: true,
            supports_audio: true,
            supports_video: true,
            supports_template: true,
            max_length: None,
            on_overlength: OverlengthPolicy::Truncate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_per_second: Option<u32>,
    pub max_per_minute: Option<u32>,
    pub max_per_hour: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicyConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub channel_id: ChannelId,
    pub room_id: RoomId,
    pub channel_type: String,
    pub category: Category,
    pub direction: BindingDirection,
    pub access: Access,
    pub muted: bool,
    pub visibility: crate::event::Visibility,
    pub participant_id: Option<ParticipantId>,
    pub last_read_index: Option<i64>,
    pub attached_at: DateTime<Utc>,
    pub capabilities: Capabilities,
    pub rate_limit: Option<RateLimitConfig>,
    pub retry_policy: Option<RetryPolicyConfig>,
    pub metadata: Value,
}

impl ChannelBinding {
    pub fn new(
        channel_id: ChannelId,
        room_id: RoomId,
        channel_type: impl Into<String>,
        category: Category,
        direction: BindingDirection,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            channel_id,
            room_id,
            channel_type: channel_type.into(),
            category,
            direction,
            access: Access::ReadWrite,
            muted: false,
            visibility: crate::event::Visibility::All,
            participant_id: None,
            last_read_index: None,
            attached_at: now,
            capabilities: Capabilities::text_only(),
            rate_limit: None,
            retry_policy: None,
            metadata: Value::Null,
        }
    }
}
