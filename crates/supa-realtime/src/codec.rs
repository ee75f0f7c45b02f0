//! Phoenix v1 JSON envelope and the codec that moves it on and off the wire.

use serde::{Deserialize, Serialize};

use crate::error::{RealtimeError, Result};

/// Topic reserved for connection-level traffic such as heartbeats.
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Event names used by the Phoenix channel protocol.
pub mod events {
    pub const HEARTBEAT: &str = "heartbeat";
    pub const JOIN: &str = "phx_join";
    pub const LEAVE: &str = "phx_leave";
    pub const REPLY: &str = "phx_reply";
    pub const ERROR: &str = "phx_error";
    pub const CLOSE: &str = "phx_close";
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const BROADCAST: &str = "broadcast";
    pub const PRESENCE: &str = "presence";
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A Phoenix protocol message envelope (v1 JSON format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
}

impl RealtimeMessage {
    pub fn new(
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
        msg_ref: Option<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            msg_ref,
        }
    }

    /// The liveness probe sent on the reserved topic.
    pub fn heartbeat(heartbeat_ref: u64) -> Self {
        Self::new(
            PHOENIX_TOPIC,
            events::HEARTBEAT,
            serde_json::json!({}),
            Some(heartbeat_ref.to_string()),
        )
    }

    /// `status` of a `phx_reply` payload (`"ok"`, `"error"`, ...).
    pub fn reply_status(&self) -> Option<&str> {
        self.payload.get("status").and_then(|s| s.as_str())
    }

    /// Human-readable reason carried by an error reply.
    pub(crate) fn reply_reason(&self) -> String {
        let response = self.payload.get("response");
        response
            .and_then(|r| r.get("reason"))
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .or_else(|| response.map(|r| r.to_string()))
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Serializes envelopes to text frames and back.
///
/// Owned by the client rather than shared globally so each connection can
/// carry its own codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec;

impl MessageCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode an envelope as a JSON text frame.
    pub fn encode(&self, message: &RealtimeMessage) -> String {
        serde_json::json!({
            "topic": message.topic,
            "event": message.event,
            "payload": message.payload,
            "ref": message.msg_ref,
        })
        .to_string()
    }

    /// Decode a text frame. Missing fields, wrong value types, or a
    /// non-object payload are reported as [`RealtimeError::MalformedMessage`].
    pub fn decode(&self, text: &str) -> Result<RealtimeMessage> {
        let message: RealtimeMessage = serde_json::from_str(text)
            .map_err(|e| RealtimeError::MalformedMessage(e.to_string()))?;
        if !message.payload.is_object() {
            return Err(RealtimeError::MalformedMessage(
                "payload must be a JSON object".to_string(),
            ));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_uses_wire_field_names() {
        let codec = MessageCodec::new();
        let text = codec.encode(&RealtimeMessage::heartbeat(3));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": "3"})
        );
    }

    #[test]
    fn encode_writes_null_ref() {
        let codec = MessageCodec::new();
        let msg = RealtimeMessage::new("realtime:room:1", "new_message", json!({}), None);
        let value: serde_json::Value = serde_json::from_str(&codec.encode(&msg)).unwrap();
        assert!(value["ref"].is_null());
    }

    #[test]
    fn decode_round_trips_nested_payload() {
        let codec = MessageCodec::new();
        let msg = RealtimeMessage::new(
            "realtime:room:1",
            "broadcast",
            json!({"type": "broadcast", "event": "typing", "payload": {"ids": [1, 2, 3], "nested": {"ok": true}}}),
            Some("42".into()),
        );
        assert_eq!(codec.decode(&codec.encode(&msg)).unwrap(), msg);
    }

    #[test]
    fn decode_accepts_missing_ref() {
        let codec = MessageCodec::new();
        let msg = codec
            .decode(r#"{"topic":"realtime:room:1","event":"presence_state","payload":{}}"#)
            .unwrap();
        assert_eq!(msg.msg_ref, None);
        assert_eq!(msg.event, "presence_state");
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let codec = MessageCodec::new();
        let msg = codec
            .decode(r#"{"topic":"t","event":"e","payload":{},"ref":null,"join_ref":"1"}"#)
            .unwrap();
        assert_eq!(msg.topic, "t");
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let codec = MessageCodec::new();
        let err = codec.decode("not json at all").unwrap_err();
        assert!(matches!(err, RealtimeError::MalformedMessage(_)));
    }

    #[test]
    fn decode_rejects_missing_topic() {
        let codec = MessageCodec::new();
        let err = codec
            .decode(r#"{"event":"heartbeat","payload":{},"ref":"1"}"#)
            .unwrap_err();
        assert!(matches!(err, RealtimeError::MalformedMessage(_)));
    }

    #[test]
    fn decode_rejects_numeric_ref() {
        let codec = MessageCodec::new();
        let err = codec
            .decode(r#"{"topic":"phoenix","event":"phx_reply","payload":{},"ref":1}"#)
            .unwrap_err();
        assert!(matches!(err, RealtimeError::MalformedMessage(_)));
    }

    #[test]
    fn decode_rejects_non_object_payload() {
        let codec = MessageCodec::new();
        let err = codec
            .decode(r#"{"topic":"phoenix","event":"phx_reply","payload":[1,2],"ref":"1"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            RealtimeError::MalformedMessage("payload must be a JSON object".into())
        );
    }

    #[test]
    fn reply_reason_prefers_reason_field() {
        let msg = RealtimeMessage::new(
            "t",
            events::REPLY,
            json!({"status": "error", "response": {"reason": "unauthorized"}}),
            Some("1".into()),
        );
        assert_eq!(msg.reply_status(), Some("error"));
        assert_eq!(msg.reply_reason(), "unauthorized");

        let bare = RealtimeMessage::new("t", events::REPLY, json!({"status": "error"}), None);
        assert_eq!(bare.reply_reason(), "unknown error");
    }
}
