//! Wire messages for the control channel.
//!
//! The channel carries JSON text frames. Outbound traffic is the single
//! `sliderMoved` event; inbound traffic is schema-free JSON that gets parsed
//! and logged but never dispatched on its `type` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from encoding or decoding channel messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messages sent from this client to the server
///
/// Tagged with a `type` field on the wire:
/// `{"type":"sliderMoved","value":"42"}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlMessage {
    /// The slider control moved; `value` carries the new position as a
    /// numeric string, exactly as the control displays it
    SliderMoved { value: String },
}

impl ControlMessage {
    pub fn slider_moved(value: impl Into<String>) -> Self {
        Self::SliderMoved {
            value: value.into(),
        }
    }

    /// Serialize to the JSON text frame sent over the socket
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A message received from the server
///
/// The server side of this channel is unspecified, so anything it sends is
/// kept verbatim alongside the parsed JSON.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub raw: String,
    pub value: serde_json::Value,
}

impl Inbound {
    /// Parse a text frame. Malformed JSON is an error for the caller to
    /// record; it must never tear down the session.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value = serde_json::from_str(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    /// One-line form for the message log. Messages that carry a `type` key
    /// get it as a prefix; everything else is shown verbatim.
    pub fn summary(&self) -> String {
        match self.value.get("type").and_then(|t| t.as_str()) {
            Some(kind) => format!("[{}] {}", kind, self.raw),
            None => self.raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_moved_wire_format() {
        let msg = ControlMessage::slider_moved("42");
        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"type":"sliderMoved","value":"42"}"#
        );
    }

    #[test]
    fn slider_moved_round_trip() {
        let msg = ControlMessage::slider_moved("73");
        let json = msg.to_json().unwrap();
        let back: ControlMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn inbound_keeps_raw_and_parsed() {
        let inbound = Inbound::parse(r#"{"type":"tick","frame":7}"#).unwrap();
        assert_eq!(inbound.raw, r#"{"type":"tick","frame":7}"#);
        assert_eq!(inbound.value["frame"], 7);
        assert!(inbound.summary().starts_with("[tick]"));
    }

    #[test]
    fn inbound_without_type_key() {
        let inbound = Inbound::parse(r#"[1,2,3]"#).unwrap();
        assert_eq!(inbound.summary(), "[1,2,3]");
    }

    #[test]
    fn inbound_rejects_malformed_json() {
        assert!(Inbound::parse("not json").is_err());
        assert!(Inbound::parse("{\"unterminated\":").is_err());
    }
}
