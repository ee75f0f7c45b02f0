//! Join-time channel configuration.

/// Configuration sent with `phx_join`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    pub broadcast: BroadcastConfig,
    pub presence: PresenceConfig,
}

/// Broadcast configuration for a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Whether to receive your own broadcasts (the server's "self" key).
    pub self_send: bool,
    /// Whether broadcasts are acknowledged by the server.
    pub ack: bool,
}

/// Presence configuration for a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceConfig {
    /// The key used to identify this client in presence state.
    pub key: String,
}

impl ChannelConfig {
    /// Serialize to the JSON payload expected by `phx_join`.
    pub(crate) fn to_join_payload(&self, access_token: Option<&str>) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "config": {
                "broadcast": {
                    "self": self.broadcast.self_send,
                    "ack": self.broadcast.ack
                },
                "presence": {
                    "key": self.presence.key
                }
            }
        });
        if let (Some(token), Some(obj)) = (access_token, payload.as_object_mut()) {
            obj.insert("access_token".into(), serde_json::Value::from(token));
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_payload_shape() {
        let config = ChannelConfig {
            broadcast: BroadcastConfig {
                self_send: true,
                ack: false,
            },
            presence: PresenceConfig {
                key: "user-1".into(),
            },
        };
        assert_eq!(
            config.to_join_payload(None),
            json!({
                "config": {
                    "broadcast": {"self": true, "ack": false},
                    "presence": {"key": "user-1"}
                }
            })
        );
    }

    #[test]
    fn join_payload_carries_access_token() {
        let payload = ChannelConfig::default().to_join_payload(Some("jwt"));
        assert_eq!(payload["access_token"], "jwt");
        assert_eq!(payload["config"]["presence"]["key"], "");
    }
}
