//! JSON wire representation of [`Message`].
//!
//! The broker expects a flat JSON object per frame:
//!
//! ```json
//! {"type":"send","replyAddress":"r.1","address":"foo.bar","headers":{"key":"value"},"body":42}
//! ```
//!
//! `headers` and `body` are spliced in verbatim as raw JSON values via
//! [`RawValue`], so the bytes a caller hands to a constructor are the bytes
//! the broker sees, and the bytes the broker sends are the bytes the caller
//! gets back. Keys with nothing to say are left out entirely: an empty
//! `replyAddress` is never written as `""`.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::{Message, MessageKind};

/// Borrowed view of a message, in wire key order.
#[derive(serde::Serialize)]
struct Outbound<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(rename = "replyAddress", skip_serializing_if = "str::is_empty")]
    reply_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "str::is_empty")]
    message: &'a str,
}

/// Owned form of an inbound frame. Unknown keys are ignored.
///
/// A missing `headers` or `body` key is absent, but an explicit `null` is a
/// JSON value like any other and is kept as the raw text `null`.
#[derive(serde::Deserialize)]
struct Inbound {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(rename = "replyAddress")]
    reply_address: Option<String>,
    address: Option<String>,
    #[serde(default, deserialize_with = "present_raw")]
    headers: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "present_raw")]
    body: Option<Box<RawValue>>,
    message: Option<String>,
}

/// Captures a key that is present, `null` included.
fn present_raw<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Box<RawValue>>, D::Error> {
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

/// Checks that `bytes` is a single JSON value and borrows it as raw JSON.
fn raw_json<'a, E: serde::ser::Error>(
    field: &str,
    bytes: Option<&'a [u8]>,
) -> Result<Option<&'a RawValue>, E> {
    bytes
        .map(|b| {
            serde_json::from_slice::<&RawValue>(b)
                .map_err(|e| E::custom(format_args!("{field} is not valid JSON: {e}")))
        })
        .transpose()
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Error messages may legitimately have no address; everything a
        // constructor builds always writes one, even if empty.
        let address = if self.is_error() && self.address.is_empty() {
            None
        } else {
            Some(self.address.as_str())
        };

        let wire = Outbound {
            kind: self.kind,
            reply_address: &self.reply_address,
            address,
            headers: raw_json::<S::Error>("headers", self.headers())?,
            body: raw_json::<S::Error>("body", self.body())?,
            message: &self.error_message,
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Inbound::deserialize(deserializer)?;
        let raw_bytes = |raw: Box<RawValue>| raw.get().as_bytes().to_vec();

        Ok(Message {
            kind: wire.kind,
            reply_address: wire.reply_address.unwrap_or_default(),
            address: wire.address.unwrap_or_default(),
            headers: wire.headers.map(raw_bytes),
            body: wire.body.map(raw_bytes),
            error_message: wire.message.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_json(msg: &Message) -> serde_json::Value {
        serde_json::to_value(msg).unwrap()
    }

    fn round_trip(msg: &Message) -> Message {
        let bytes = serde_json::to_vec(msg).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // =====================================================================
    // Exact wire shape
    // =====================================================================

    #[test]
    fn test_register_wire_format() {
        let bytes = serde_json::to_vec(&Message::register("foo.bar")).unwrap();
        assert_eq!(bytes, br#"{"type":"register","address":"foo.bar"}"#);
    }

    #[test]
    fn test_unregister_omits_headers_and_body() {
        let json = to_json(&Message::unregister("foo.bar"));
        assert_eq!(json, json!({"type": "unregister", "address": "foo.bar"}));
    }

    #[test]
    fn test_empty_reply_address_is_omitted() {
        let msg = Message::send("foo.bar", "", b"{}".to_vec(), b"1".to_vec());
        let json = to_json(&msg);
        assert!(json.get("replyAddress").is_none());
    }

    #[test]
    fn test_reply_address_uses_camel_case_key() {
        let msg = Message::send("foo.bar", "reply.7", Vec::new(), Vec::new());
        let json = to_json(&msg);
        assert_eq!(json["replyAddress"], "reply.7");
    }

    #[test]
    fn test_headers_and_body_are_embedded_as_json() {
        // The payload appears as nested JSON, not as a string or byte array.
        let msg = Message::publish(
            "news",
            br#"{"key":"value"}"#.to_vec(),
            br#"{"alpha":"hello"}"#.to_vec(),
        );
        let json = to_json(&msg);
        assert_eq!(json["headers"], json!({"key": "value"}));
        assert_eq!(json["body"], json!({"alpha": "hello"}));
    }

    #[test]
    fn test_invalid_json_body_fails_to_encode() {
        let msg = Message::publish("news", Vec::new(), b"not json".to_vec());
        let err = serde_json::to_vec(&msg).unwrap_err();
        assert!(err.to_string().contains("body is not valid JSON"));
    }

    // =====================================================================
    // Round trips
    // =====================================================================

    #[test]
    fn test_round_trip_every_constructor() {
        let messages = [
            Message::send(
                "foo.bar",
                "reply.1",
                br#"{"key":"value"}"#.to_vec(),
                br#"{"alpha":"hello","beta":{"hello":"world"}}"#.to_vec(),
            ),
            Message::send("foo.bar", "", Vec::new(), b"\"x\"".to_vec()),
            Message::publish("foo.bar", br#"{"a":1}"#.to_vec(), b"[1,2,3]".to_vec()),
            Message::register("foo.bar"),
            Message::unregister("foo.bar"),
        ];
        for msg in &messages {
            assert_eq!(&round_trip(msg), msg);
        }
    }

    #[test]
    fn test_raw_payload_bytes_survive_unchanged() {
        let body = br#"{"z":1,"a":[true,null]}"#.to_vec();
        let msg = Message::publish("x", Vec::new(), body.clone());
        assert_eq!(round_trip(&msg).body(), Some(body.as_slice()));
    }

    // =====================================================================
    // Inbound frames
    // =====================================================================

    #[test]
    fn test_decode_broker_error() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"err","message":"access_denied"}"#).unwrap();
        assert!(msg.is_error());
        assert_eq!(msg.address(), "");
        assert_eq!(msg.error_message(), Some("access_denied"));
    }

    #[test]
    fn test_error_without_address_round_trips() {
        let msg: Message = serde_json::from_str(r#"{"type":"err","message":"boom"}"#).unwrap();
        let json = to_json(&msg);
        assert_eq!(json, json!({"type": "err", "message": "boom"}));
    }

    #[test]
    fn test_missing_headers_and_body_are_absent() {
        let msg: Message = serde_json::from_str(r#"{"type":"send","address":"a"}"#).unwrap();
        assert_eq!(msg.headers(), None);
        assert_eq!(msg.body(), None);
    }

    #[test]
    fn test_null_headers_and_body_are_kept() {
        let msg: Message = serde_json::from_str(
            r#"{"type":"send","address":"a","headers":null,"body":null}"#,
        )
        .unwrap();
        assert_eq!(msg.headers(), Some(&b"null"[..]));
        assert_eq!(msg.body(), Some(&b"null"[..]));
    }

    #[test]
    fn test_null_body_round_trips() {
        let msg = Message::send("foo.bar", "", br#"{"k":"v"}"#.to_vec(), b"null".to_vec());
        let bytes = serde_json::to_vec(&msg).unwrap();
        assert_eq!(
            bytes,
            br#"{"type":"send","address":"foo.bar","headers":{"k":"v"},"body":null}"#
        );
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_empty_reply_address_on_wire_means_no_reply() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"send","address":"a","replyAddress":""}"#).unwrap();
        assert_eq!(msg.reply_address(), None);
        assert_eq!(msg, Message::send("a", "", Vec::new(), Vec::new()));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"publish","address":"a","send":true}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Publish);
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"address":"foo.bar"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<Message, _> =
            serde_json::from_str(r#"{"type":"teleport","address":"foo.bar"}"#);
        assert!(result.is_err());
    }
}
