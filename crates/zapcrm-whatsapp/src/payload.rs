// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed parsing of the session service's message payload shapes.
//!
//! The service answers message queries in three shapes: a flat array, an
//! object keyed by platform identifier, or a contact-specific record.
//! Each shape is attempted in sequence and produces a typed result, so
//! consumers never branch on raw JSON structure.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;
use zapcrm_core::{WaMessage, ZapcrmError};

/// A message query response, normalized into one of the known shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagesPayload {
    /// Shape (a): a flat array of messages.
    Flat(Vec<WaMessage>),
    /// Shape (b): messages grouped by platform-native identifier.
    Grouped {
        messages: BTreeMap<String, Vec<WaMessage>>,
        total: Option<u64>,
    },
    /// Shape (c): a contact-specific endpoint's record.
    Contact {
        number: String,
        messages: Vec<WaMessage>,
    },
}

#[derive(Deserialize)]
struct GroupedWire {
    messages: BTreeMap<String, Vec<WaMessage>>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Deserialize)]
struct ContactWire {
    // The original service includes `number`; tolerate records without it.
    #[serde(default)]
    number: String,
    messages: Vec<WaMessage>,
}

/// Parses a raw JSON value into one of the known payload shapes.
///
/// Shapes are tried in order: flat array, grouped map, contact record.
/// Returns a [`ZapcrmError::Payload`] naming the unexpected structure when
/// none fits; callers degrade to an empty list rather than propagating.
pub fn parse_messages_payload(value: serde_json::Value) -> Result<MessagesPayload, ZapcrmError> {
    if value.is_array() {
        let flat: Vec<WaMessage> = serde_json::from_value(value)
            .map_err(|e| ZapcrmError::Payload(format!("flat message array: {e}")))?;
        return Ok(MessagesPayload::Flat(flat));
    }

    if let Ok(grouped) = serde_json::from_value::<GroupedWire>(value.clone()) {
        return Ok(MessagesPayload::Grouped {
            messages: grouped.messages,
            total: grouped.total,
        });
    }

    if let Ok(contact) = serde_json::from_value::<ContactWire>(value.clone()) {
        return Ok(MessagesPayload::Contact {
            number: contact.number,
            messages: contact.messages,
        });
    }

    let keys = value
        .as_object()
        .map(|o| o.keys().cloned().collect::<Vec<_>>().join(","))
        .unwrap_or_else(|| value.to_string());
    debug!(keys = %keys, "message payload matched no known shape");
    Err(ZapcrmError::Payload(format!(
        "message payload matched no known shape (keys: {keys})"
    )))
}

impl MessagesPayload {
    /// Total number of messages across all groups.
    pub fn len(&self) -> usize {
        match self {
            MessagesPayload::Flat(msgs) => msgs.len(),
            MessagesPayload::Grouped { messages, .. } => messages.values().map(Vec::len).sum(),
            MessagesPayload::Contact { messages, .. } => messages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_array_parses() {
        let value = json!([
            {"id": "m1", "body": "oi", "from": "a@c.us", "to": "b@c.us", "fromMe": false, "timestamp": "2024-01-01T10:00:00Z"}
        ]);
        let payload = parse_messages_payload(value).unwrap();
        match payload {
            MessagesPayload::Flat(msgs) => {
                assert_eq!(msgs.len(), 1);
                assert_eq!(msgs[0].id, "m1");
            }
            other => panic!("expected Flat, got {other:?}"),
        }
    }

    #[test]
    fn grouped_map_parses() {
        let value = json!({
            "messages": {
                "5521987868395@c.us": [
                    {"id": "m1", "body": "oi", "fromMe": false, "timestamp": "2024-01-01T10:00:00Z"}
                ]
            },
            "total": 1
        });
        let payload = parse_messages_payload(value).unwrap();
        match payload {
            MessagesPayload::Grouped { messages, total } => {
                assert_eq!(total, Some(1));
                assert_eq!(messages["5521987868395@c.us"].len(), 1);
            }
            other => panic!("expected Grouped, got {other:?}"),
        }
    }

    #[test]
    fn contact_record_parses() {
        let value = json!({
            "number": "5521987868395",
            "messages": [
                {"id": "m1", "body": "oi", "fromMe": false, "timestamp": "2024-01-01T10:00:00Z"}
            ]
        });
        let payload = parse_messages_payload(value).unwrap();
        match payload {
            MessagesPayload::Contact { number, messages } => {
                assert_eq!(number, "5521987868395");
                assert_eq!(messages.len(), 1);
            }
            other => panic!("expected Contact, got {other:?}"),
        }
    }

    #[test]
    fn contact_record_without_number_parses() {
        let value = json!({
            "messages": [
                {"id": "m1", "body": "oi", "fromMe": false, "timestamp": "2024-01-01T10:00:00Z"}
            ]
        });
        let payload = parse_messages_payload(value).unwrap();
        match payload {
            MessagesPayload::Contact { number, messages } => {
                assert!(number.is_empty());
                assert_eq!(messages.len(), 1);
            }
            other => panic!("expected Contact, got {other:?}"),
        }
    }

    #[test]
    fn empty_grouped_map_is_empty() {
        let value = json!({"messages": {}, "total": 0});
        let payload = parse_messages_payload(value).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn unknown_shape_is_a_payload_error() {
        let value = json!({"surprise": true});
        let err = parse_messages_payload(value).unwrap_err();
        assert!(matches!(err, ZapcrmError::Payload(_)));
        assert!(err.to_string().contains("surprise"));
    }

    #[test]
    fn scalar_is_a_payload_error() {
        let err = parse_messages_payload(json!(42)).unwrap_err();
        assert!(matches!(err, ZapcrmError::Payload(_)));
    }
}
