use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! generated_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Mints a new time-sortable id (UUIDv7).
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

generated_id!(RoomId);
generated_id!(EventId);
generated_id!(ParticipantId);
generated_id!(IdentityId);
generated_id!(TaskId);
generated_id!(ObservationId);
generated_id!(SubscriptionId);

/// Channel ids are supplied by the host (e.g. `"sms:+15551234567"`), never
/// generated here — they identify an externally-registered adapter instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = RoomId::generate();
        let b = RoomId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn channel_id_is_not_generated_from_thin_air() {
        let c = ChannelId::new("sms:+15551234567");
        assert_eq!(c.as_str(), "sms:+15551234567");
    }
}
