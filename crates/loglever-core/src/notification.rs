// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire format for live logging reconfiguration.
//!
//! Every frame on the broadcast channel is a JSON envelope:
//!
//! ```text
//! {"type": 0, "payload": {"enable": false}}
//! {"type": 1, "payload": {"name": "arpd", "level": "debug"}}
//! ```
//!
//! `type` is `0` / `"global"` for the global switch and `1` / `"component"`
//! for a per-component threshold. The payload is an embedded document and may
//! arrive as a JSON object, as a string holding JSON text, or as base64 of the
//! JSON text (how publishers that treat the payload as bytes send it).
//! Capitalised field names (`Type`, `Payload`, `Enable`, ...) are accepted.
//!
//! # Example
//!
//! ```
//! use loglever_core::notification::{decode, encode_component, DecodedUpdate};
//! use loglever_core::SeverityLevel;
//!
//! let frame = encode_component("arpd", SeverityLevel::Debug);
//! assert_eq!(
//!     decode(&frame).unwrap(),
//!     DecodedUpdate::Component { name: "arpd".to_string(), level: SeverityLevel::Debug },
//! );
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::level::SeverityLevel;

/// Numeric discriminator of the global on/off notification.
pub const GLOBAL_KIND: u64 = 0;
/// Numeric discriminator of the per-component threshold notification.
pub const COMPONENT_KIND: u64 = 1;

/// The notification kinds this facade understands, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
	Global,
	Component,
	Unknown(String),
}

/// A parsed envelope whose payload has not been interpreted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEnvelope {
	pub kind: NotificationKind,
	pub payload: Option<Value>,
}

/// Result of decoding a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedUpdate {
	Global(bool),
	Component { name: String, level: SeverityLevel },
	/// A well-formed envelope of a kind this facade does not handle.
	Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalPayload {
	#[serde(alias = "Enable")]
	pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentPayload {
	#[serde(alias = "Name")]
	pub name: String,
	#[serde(alias = "Level")]
	pub level: SeverityLevel,
}

#[derive(Deserialize)]
struct RawEnvelope {
	#[serde(rename = "type", alias = "Type")]
	kind: Value,
	#[serde(default, alias = "Payload")]
	payload: Option<Value>,
}

impl NotificationEnvelope {
	/// Parses the top-level structure of a frame.
	pub fn parse(frame: &[u8]) -> Result<Self, DecodeError> {
		let raw: RawEnvelope = serde_json::from_slice(frame)
			.map_err(|e| DecodeError::Malformed(format!("invalid envelope: {e}")))?;

		let kind = match &raw.kind {
			Value::Number(n) => match n.as_u64() {
				Some(GLOBAL_KIND) => NotificationKind::Global,
				Some(COMPONENT_KIND) => NotificationKind::Component,
				_ => NotificationKind::Unknown(n.to_string()),
			},
			Value::String(s) if s.eq_ignore_ascii_case("global") => NotificationKind::Global,
			Value::String(s) if s.eq_ignore_ascii_case("component") => NotificationKind::Component,
			Value::String(s) => NotificationKind::Unknown(s.clone()),
			other => {
				return Err(DecodeError::Malformed(format!(
					"notification type must be a number or string, got {other}"
				)))
			}
		};

		Ok(Self {
			kind,
			payload: raw.payload.filter(|p| !p.is_null()),
		})
	}

	/// Interprets the payload according to the envelope kind.
	pub fn into_update(self) -> Result<DecodedUpdate, DecodeError> {
		match self.kind {
			NotificationKind::Global => {
				let payload: GlobalPayload = parse_payload(self.payload, "global")?;
				Ok(DecodedUpdate::Global(payload.enable))
			}
			NotificationKind::Component => {
				let payload: ComponentPayload = parse_payload(self.payload, "component")?;
				Ok(DecodedUpdate::Component {
					name: payload.name,
					level: payload.level,
				})
			}
			NotificationKind::Unknown(_) => Ok(DecodedUpdate::Ignored),
		}
	}
}

/// Decodes one frame into a typed update.
pub fn decode(frame: &[u8]) -> Result<DecodedUpdate, DecodeError> {
	NotificationEnvelope::parse(frame)?.into_update()
}

/// Encodes a global on/off notification.
pub fn encode_global(enable: bool) -> Vec<u8> {
	serde_json::json!({
		"type": GLOBAL_KIND,
		"payload": { "enable": enable },
	})
	.to_string()
	.into_bytes()
}

/// Encodes a per-component threshold notification.
pub fn encode_component(name: &str, level: SeverityLevel) -> Vec<u8> {
	serde_json::json!({
		"type": COMPONENT_KIND,
		"payload": { "name": name, "level": level.as_str() },
	})
	.to_string()
	.into_bytes()
}

fn parse_payload<T>(payload: Option<Value>, kind: &str) -> Result<T, DecodeError>
where
	T: for<'de> Deserialize<'de>,
{
	let payload =
		payload.ok_or_else(|| DecodeError::Malformed(format!("{kind} notification has no payload")))?;
	let document = unwrap_document(payload, kind)?;
	serde_json::from_value(document)
		.map_err(|e| DecodeError::Malformed(format!("invalid {kind} payload: {e}")))
}

/// Resolves the embedded payload document to a JSON object.
fn unwrap_document(payload: Value, kind: &str) -> Result<Value, DecodeError> {
	match payload {
		Value::Object(_) => Ok(payload),
		Value::String(text) => {
			if let Ok(doc @ Value::Object(_)) = serde_json::from_str::<Value>(&text) {
				return Ok(doc);
			}
			let bytes = STANDARD.decode(text.trim()).map_err(|_| {
				DecodeError::Malformed(format!("{kind} payload is neither JSON nor base64"))
			})?;
			match serde_json::from_slice::<Value>(&bytes) {
				Ok(doc @ Value::Object(_)) => Ok(doc),
				_ => Err(DecodeError::Malformed(format!(
					"{kind} payload does not contain a JSON object"
				))),
			}
		}
		other => Err(DecodeError::Malformed(format!(
			"{kind} payload must be an object or encoded document, got {other}"
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn component(name: &str, level: SeverityLevel) -> DecodedUpdate {
		DecodedUpdate::Component {
			name: name.to_string(),
			level,
		}
	}

	#[test]
	fn test_decode_global_object_payload() {
		let frame = br#"{"type": 0, "payload": {"enable": false}}"#;
		assert_eq!(decode(frame).unwrap(), DecodedUpdate::Global(false));
	}

	#[test]
	fn test_decode_component_object_payload() {
		let frame = br#"{"type": 1, "payload": {"name": "arpd", "level": "warn"}}"#;
		assert_eq!(
			decode(frame).unwrap(),
			component("arpd", SeverityLevel::Warning)
		);
	}

	#[test]
	fn test_decode_string_discriminators() {
		let frame = br#"{"type": "GLOBAL", "payload": {"enable": true}}"#;
		assert_eq!(decode(frame).unwrap(), DecodedUpdate::Global(true));
		let frame = br#"{"type": "component", "payload": {"name": "x", "level": "trace"}}"#;
		assert_eq!(decode(frame).unwrap(), component("x", SeverityLevel::Trace));
	}

	#[test]
	fn test_decode_capitalised_fields() {
		let frame = br#"{"Type": 1, "Payload": {"Name": "bgpd", "Level": "crit"}}"#;
		assert_eq!(
			decode(frame).unwrap(),
			component("bgpd", SeverityLevel::Critical)
		);
	}

	#[test]
	fn test_decode_json_text_payload() {
		let frame = br#"{"type": 0, "payload": "{\"enable\": true}"}"#;
		assert_eq!(decode(frame).unwrap(), DecodedUpdate::Global(true));
	}

	#[test]
	fn test_decode_base64_payload() {
		let inner = STANDARD.encode(br#"{"Name":"ribd","Level":"debug"}"#);
		let frame = format!(r#"{{"Type":1,"Payload":"{inner}"}}"#);
		assert_eq!(
			decode(frame.as_bytes()).unwrap(),
			component("ribd", SeverityLevel::Debug)
		);
	}

	#[test]
	fn test_unknown_kind_is_ignored() {
		assert_eq!(
			decode(br#"{"type": 7, "payload": {"anything": 1}}"#).unwrap(),
			DecodedUpdate::Ignored
		);
		assert_eq!(
			decode(br#"{"type": "port-state"}"#).unwrap(),
			DecodedUpdate::Ignored
		);
	}

	#[test]
	fn test_malformed_top_level() {
		for frame in [
			&b"not json"[..],
			br#""just a string""#,
			b"42",
			br#"{"payload": {"enable": true}}"#,
			br#"{"type": null, "payload": {}}"#,
			br#"{"type": true, "payload": {}}"#,
			b"",
		] {
			assert!(
				matches!(decode(frame), Err(DecodeError::Malformed(_))),
				"expected malformed for {:?}",
				String::from_utf8_lossy(frame)
			);
		}
	}

	#[test]
	fn test_malformed_payloads() {
		for frame in [
			&br#"{"type": 0}"#[..],
			br#"{"type": 0, "payload": {"enable": "yes"}}"#,
			br#"{"type": 0, "payload": {"enable": true, "extra": 1}}"#,
			br#"{"type": 1, "payload": {"name": "arpd"}}"#,
			br#"{"type": 1, "payload": {"name": "arpd", "level": "loud"}}"#,
			br#"{"type": 1, "payload": 42}"#,
			br#"{"type": 1, "payload": "%%%not-base64%%%"}"#,
		] {
			assert!(
				matches!(decode(frame), Err(DecodeError::Malformed(_))),
				"expected malformed for {}",
				String::from_utf8_lossy(frame)
			);
		}
	}

	#[test]
	fn test_encoders_produce_decodable_frames() {
		assert_eq!(decode(&encode_global(false)).unwrap(), DecodedUpdate::Global(false));
		assert_eq!(
			decode(&encode_component("lldpd", SeverityLevel::Notice)).unwrap(),
			component("lldpd", SeverityLevel::Notice)
		);
	}

	#[test]
	fn test_envelope_exposes_kind() {
		let envelope = NotificationEnvelope::parse(br#"{"type": 3}"#).unwrap();
		assert_eq!(envelope.kind, NotificationKind::Unknown("3".to_string()));
		assert!(envelope.payload.is_none());
	}
}
