// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message reconciliation: matching platform messages to a CRM lead.
//!
//! Stateless, pure functions. The session facade decides which payload to
//! feed in (targeted endpoint first, full scan as fallback); this module
//! only filters, orders, and detects new inbound traffic.

use tracing::debug;
use zapcrm_core::{Lead, WaMessage};

use crate::payload::MessagesPayload;
use crate::phone::is_same_contact;

/// Selects and orders the messages belonging to `lead` from a parsed
/// payload.
///
/// - Grouped payloads match per platform key; a matching key contributes
///   its entire group without message-level re-filtering.
/// - Flat and contact payloads match per message against both `from` and
///   `to`.
///
/// The result is sorted newest-first; malformed timestamps parse to the
/// Unix epoch and therefore sort last.
pub fn extract_messages_for_lead(payload: &MessagesPayload, lead: &Lead) -> Vec<WaMessage> {
    let Some(lead_phone) = lead.phone.as_deref() else {
        return Vec::new();
    };

    let mut selected: Vec<WaMessage> = match payload {
        MessagesPayload::Flat(messages) | MessagesPayload::Contact { messages, .. } => messages
            .iter()
            .filter(|msg| {
                is_same_contact(lead_phone, &msg.from) || is_same_contact(lead_phone, &msg.to)
            })
            .cloned()
            .collect(),
        MessagesPayload::Grouped { messages, .. } => {
            let mut matched_keys = 0usize;
            let mut out = Vec::new();
            for (key, group) in messages {
                if is_same_contact(lead_phone, key) {
                    matched_keys += 1;
                    out.extend(group.iter().cloned());
                }
            }
            if matched_keys > 1 {
                // Loose tail matching can collide; first-match-per-key
                // aggregation is the documented policy.
                debug!(
                    lead_id = %lead.id,
                    matched_keys,
                    "lead phone matched multiple platform keys"
                );
            }
            out
        }
    };

    sort_newest_first(&mut selected);
    selected
}

/// Sorts messages newest-first for history display.
pub fn sort_newest_first(messages: &mut [WaMessage]) {
    messages.sort_by_key(|msg| std::cmp::Reverse(msg.timestamp_utc()));
}

/// Detects a new inbound message between two reconciliation snapshots.
///
/// True when `current` has strictly more entries than `previous` and at
/// least one inbound (`!from_me`) message in `current` is strictly newer
/// than the newest message in `previous`.
///
/// The signal is transient: callers clear it after a fixed display window.
/// This function holds no state between calls.
pub fn detect_new_inbound(previous: &[WaMessage], current: &[WaMessage]) -> bool {
    if current.len() <= previous.len() {
        return false;
    }

    let newest_previous = previous
        .iter()
        .map(WaMessage::timestamp_utc)
        .max()
        .unwrap_or(chrono::DateTime::UNIX_EPOCH);

    current
        .iter()
        .any(|msg| !msg.from_me && msg.timestamp_utc() > newest_previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn msg(id: &str, from: &str, to: &str, from_me: bool, timestamp: &str) -> WaMessage {
        WaMessage {
            id: id.into(),
            body: format!("body-{id}"),
            from: from.into(),
            to: to.into(),
            from_me,
            timestamp: timestamp.into(),
        }
    }

    fn lead(phone: Option<&str>) -> Lead {
        Lead {
            id: "lead-1".into(),
            name: "Maria".into(),
            phone: phone.map(Into::into),
        }
    }

    #[test]
    fn grouped_payload_includes_whole_matching_group() {
        let mut groups = BTreeMap::new();
        groups.insert(
            "5521987868395@c.us".to_string(),
            vec![
                msg("m1", "x", "y", false, "2024-01-01T10:00:00Z"),
                msg("m2", "x", "y", true, "2024-01-01T11:00:00Z"),
            ],
        );
        groups.insert(
            "5511912345678@c.us".to_string(),
            vec![msg("m3", "x", "y", false, "2024-01-01T12:00:00Z")],
        );
        let payload = MessagesPayload::Grouped {
            messages: groups,
            total: Some(3),
        };

        let result = extract_messages_for_lead(&payload, &lead(Some("21987868395")));
        // Group-level match: m1 and m2 both included despite unrelated
        // from/to fields, newest first.
        assert_eq!(
            result.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m2", "m1"]
        );
    }

    #[test]
    fn flat_payload_matches_from_and_to() {
        let payload = MessagesPayload::Flat(vec![
            msg(
                "in",
                "5521987868395@c.us",
                "me@c.us",
                false,
                "2024-01-01T10:00:00Z",
            ),
            msg(
                "out",
                "me@c.us",
                "5521987868395@c.us",
                true,
                "2024-01-01T11:00:00Z",
            ),
            msg(
                "other",
                "5511912345678@c.us",
                "me@c.us",
                false,
                "2024-01-01T12:00:00Z",
            ),
        ]);

        let result = extract_messages_for_lead(&payload, &lead(Some("21987868395")));
        assert_eq!(
            result.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["out", "in"]
        );
    }

    #[test]
    fn lead_without_phone_gets_nothing() {
        let payload = MessagesPayload::Flat(vec![msg(
            "m1",
            "5521987868395@c.us",
            "me@c.us",
            false,
            "2024-01-01T10:00:00Z",
        )]);
        assert!(extract_messages_for_lead(&payload, &lead(None)).is_empty());
    }

    #[test]
    fn malformed_timestamps_sort_last() {
        let mut messages = vec![
            msg("bad", "a", "b", false, "not-a-date"),
            msg("old", "a", "b", false, "2024-01-01T10:00:00Z"),
            msg("new", "a", "b", false, "2024-01-02T10:00:00Z"),
        ];
        sort_newest_first(&mut messages);
        assert_eq!(
            messages.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["new", "old", "bad"]
        );
    }

    #[test]
    fn new_inbound_detected_for_newer_incoming_message() {
        let previous = vec![msg("m1", "a", "b", false, "2024-01-01T10:00:00Z")];
        let current = vec![
            msg("m2", "a", "b", false, "2024-01-01T11:00:00Z"),
            msg("m1", "a", "b", false, "2024-01-01T10:00:00Z"),
        ];
        assert!(detect_new_inbound(&previous, &current));
    }

    #[test]
    fn outbound_message_is_not_new_inbound() {
        let previous = vec![msg("m1", "a", "b", false, "2024-01-01T10:00:00Z")];
        let current = vec![
            msg("m2", "a", "b", true, "2024-01-01T11:00:00Z"),
            msg("m1", "a", "b", false, "2024-01-01T10:00:00Z"),
        ];
        assert!(!detect_new_inbound(&previous, &current));
    }

    #[test]
    fn same_length_snapshots_are_not_new() {
        let previous = vec![msg("m1", "a", "b", false, "2024-01-01T10:00:00Z")];
        let current = vec![msg("m2", "a", "b", false, "2024-01-01T11:00:00Z")];
        assert!(!detect_new_inbound(&previous, &current));
    }

    #[test]
    fn first_snapshot_with_inbound_counts_as_new() {
        let current = vec![msg("m1", "a", "b", false, "2024-01-01T10:00:00Z")];
        assert!(detect_new_inbound(&[], &current));
    }
}
