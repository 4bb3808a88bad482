//! Socket.IO v4 framing over an Engine.IO v4 websocket.
//!
//! Only the default namespace and text frames are handled; the backend
//! never sends binary attachments.

use serde::Deserialize;
use serde_json::Value;

/// Client request to join the default namespace.
pub const CONNECT: &str = "40";
/// Reply to an Engine.IO ping.
pub const PONG: &str = "3";

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown packet type {0:?}")]
    UnknownPacket(char),

    #[error("Malformed packet: {0}")]
    Malformed(String),

    #[error("Bad payload for {event}: {reason}")]
    Payload { event: String, reason: String },
}

/// Engine.IO open handshake.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    /// Namespace joined
    Connect,
    Disconnect,
    Event { name: String, payload: Value },
    /// Acks are never requested by this client
    Ack,
    ConnectError(Value),
}

pub fn decode(frame: &str) -> Result<Packet, WireError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(WireError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Packet::Open)
            .map_err(|e| WireError::Malformed(format!("handshake: {}", e))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_message(rest),
        '5' | '6' => Ok(Packet::Noop),
        other => Err(WireError::UnknownPacket(other)),
    }
}

fn decode_message(message: &str) -> Result<Packet, WireError> {
    let mut chars = message.chars();
    let kind = chars.next().ok_or(WireError::Empty)?;
    let body = strip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(body),
        '3' => Ok(Packet::Ack),
        '4' => Ok(Packet::ConnectError(
            serde_json::from_str(body).unwrap_or(Value::Null),
        )),
        other => Err(WireError::UnknownPacket(other)),
    }
}

/// Drop a `/namespace,` prefix and any ack id before the JSON body.
fn strip_namespace(body: &str) -> &str {
    let body = if body.starts_with('/') {
        body.split_once(',').map(|(_, rest)| rest).unwrap_or("")
    } else {
        body
    };
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(body: &str) -> Result<Packet, WireError> {
    let args: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| WireError::Malformed(format!("event body: {}", e)))?;
    let mut args = args.into_iter();

    let name = match args.next() {
        Some(Value::String(name)) => name,
        _ => return Err(WireError::Malformed("event without a name".to_string())),
    };
    let payload = args.next().unwrap_or(Value::Null);

    Ok(Packet::Event { name, payload })
}

pub fn encode_event(name: &str, payload: &Value) -> String {
    format!("42{}", Value::Array(vec![Value::String(name.to_string()), payload.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_handshake() {
        let packet =
            decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
                .unwrap();
        assert_eq!(
            packet,
            Packet::Open(Handshake {
                sid: "abc".to_string(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn decodes_event_with_payload() {
        let packet = decode(r#"42["update_power",{"battery":12.3,"battery_pct":85}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "update_power".to_string(),
                payload: json!({"battery": 12.3, "battery_pct": 85}),
            }
        );
    }

    #[test]
    fn strips_namespace_and_ack_id() {
        let packet = decode(r#"42/panel,7["set_active_scene",{"scene_id":null}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "set_active_scene".to_string(),
                payload: json!({"scene_id": null}),
            }
        );
    }

    #[test]
    fn event_without_payload_gets_null() {
        let packet = decode(r#"42["ping_panel"]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event { name: "ping_panel".to_string(), payload: Value::Null }
        );
    }

    #[test]
    fn control_packets() {
        assert_eq!(decode("2").unwrap(), Packet::Ping);
        assert_eq!(decode(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Connect);
        assert_eq!(decode("41").unwrap(), Packet::Disconnect);
        assert!(matches!(decode(""), Err(WireError::Empty)));
        assert!(matches!(decode("9"), Err(WireError::UnknownPacket('9'))));
        assert!(matches!(decode("42{}"), Err(WireError::Malformed(_))));
    }

    #[test]
    fn encodes_event() {
        let frame = encode_event("apply_scene", &json!({"scene_id": "evening"}));
        assert_eq!(frame, r#"42["apply_scene",{"scene_id":"evening"}]"#);
    }
}
