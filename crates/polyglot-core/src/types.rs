use serde::{Deserialize, Serialize};

// Platform snowflake ids.  Newtypes so a guild id can never be passed where a
// channel id is expected.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

macro_rules! impl_display {
    ($($id:ident),*) => {
        $(
            impl std::fmt::Display for $id {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<u64> for $id {
                fn from(raw: u64) -> Self {
                    Self(raw)
                }
            }
        )*
    };
}

impl_display!(GuildId, ChannelId, MessageId, UserId);

/// The channel-shape a translated message is published into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    /// Webhook post in the source channel, impersonating the original author.
    Inline,
    /// Post in the channel's dedicated translation thread.
    Threaded,
    /// Private mirror sent to the original author.
    Dm,
}

impl DeliveryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryKind::Inline => "inline",
            DeliveryKind::Threaded => "threaded",
            DeliveryKind::Dm => "dm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inline" => Some(DeliveryKind::Inline),
            "threaded" => Some(DeliveryKind::Threaded),
            "dm" => Some(DeliveryKind::Dm),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_kind_round_trip() {
        for kind in [DeliveryKind::Inline, DeliveryKind::Threaded, DeliveryKind::Dm] {
            assert_eq!(DeliveryKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(DeliveryKind::from_str("carrier-pigeon"), None);
    }
}
