// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone identity normalization and pairwise contact matching.
//!
//! CRM lead records and the messaging platform format the same real-world
//! number inconsistently: with or without the `55` country code, with or
//! without punctuation, and platform identifiers carry a domain-style
//! suffix (`5521987868395@c.us`). Canonicalization reduces both sides to
//! digits; matching is deliberately loose (suffix plus fixed-length-tail
//! rules) to trade precision for recall. False positives on
//! coincidentally-matching short tails are a known, accepted limitation.

/// Reduces a raw phone string to its canonical digits-only form.
///
/// Any platform suffix (everything from the first `@`) is dropped first,
/// then all non-digit characters. Empty input yields an empty string,
/// which callers must treat as "never matches", not as a wildcard.
///
/// Canonicalization is idempotent.
pub fn canonicalize(raw: &str) -> String {
    let without_suffix = raw.split('@').next().unwrap_or_default();
    without_suffix.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Decides whether a CRM lead phone and a platform message address denote
/// the same contact.
///
/// Rules, in order:
/// 1. Either canonical form empty: no match.
/// 2. Exact canonical equality.
/// 3. One side is a suffix of the other (one side carries a country code
///    the other lacks).
/// 4. Last 8 digits equal and both sides have at least 8 (landline-length
///    numbers missing an area code on one side).
/// 5. Last 9 digits equal and both sides have at least 9 (mobile-length
///    numbers with or without the leading mobile-prefix digit).
///
/// The relation is reflexive and symmetric but not transitive, so it must
/// be evaluated pairwise and never cached as a global partition.
pub fn is_same_contact(lead_phone: &str, message_phone: &str) -> bool {
    let lead = canonicalize(lead_phone);
    let message = canonicalize(message_phone);

    if lead.is_empty() || message.is_empty() {
        return false;
    }

    if lead == message {
        return true;
    }

    if lead.ends_with(&message) || message.ends_with(&lead) {
        return true;
    }

    tail_matches(&lead, &message, 8) || tail_matches(&lead, &message, 9)
}

/// True when both numbers have at least `n` digits and their last `n`
/// digits agree.
fn tail_matches(a: &str, b: &str, n: usize) -> bool {
    a.len() >= n && b.len() >= n && a[a.len() - n..] == b[b.len() - n..]
}

/// Formats a canonical number for display.
///
/// Brazilian numbers with the country code render as
/// `+55 (21) 98786-8395`; anything else falls back to the raw canonical
/// digits. Purely presentational and never consulted during matching.
pub fn format_display(phone: &str, country_code: &str) -> String {
    let digits = canonicalize(phone);
    if digits.is_empty() {
        return String::new();
    }

    let cc_len = country_code.len();
    if digits.starts_with(country_code) && digits.len() >= cc_len + 10 {
        let area = &digits[cc_len..cc_len + 2];
        let subscriber = &digits[cc_len + 2..];
        let split = subscriber.len().saturating_sub(4);
        return format!(
            "+{country_code} ({area}) {}-{}",
            &subscriber[..split],
            &subscriber[split..]
        );
    }

    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_suffix_and_punctuation() {
        assert_eq!(canonicalize("5521987868395@c.us"), "5521987868395");
        assert_eq!(canonicalize("+55 (21) 98786-8395"), "5521987868395");
        assert_eq!(canonicalize("21 98786 8395"), "21987868395");
    }

    #[test]
    fn canonicalize_empty_input_is_empty() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("@c.us"), "");
        assert_eq!(canonicalize("abc"), "");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let samples = [
            "5521987868395@c.us",
            "+55 (21) 98786-8395",
            "21987868395",
            "",
            "abc@g.us",
        ];
        for s in samples {
            let once = canonicalize(s);
            assert_eq!(canonicalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn same_contact_is_reflexive_for_non_empty() {
        for p in ["5521987868395", "21987868395", "987868395"] {
            assert!(is_same_contact(p, p), "not reflexive for {p}");
        }
    }

    #[test]
    fn suffix_match_tolerates_country_code() {
        assert!(is_same_contact("5521987868395", "21987868395"));
        assert!(is_same_contact("21987868395", "5521987868395"));
        assert!(is_same_contact("21987868395", "5521987868395@c.us"));
    }

    #[test]
    fn last_nine_digits_tolerate_mobile_prefix() {
        // One side lacks the leading `9` mobile prefix digit but the
        // nine-digit tails still agree when both carry them.
        assert!(is_same_contact("5521987868395", "987868395"));
    }

    #[test]
    fn last_eight_digits_tolerate_missing_area_code() {
        assert!(is_same_contact("2187868395", "87868395"));
    }

    #[test]
    fn unrelated_numbers_do_not_match() {
        assert!(!is_same_contact("5521987868395", "5511912345678"));
        assert!(!is_same_contact("21987868395", "11912345678"));
    }

    #[test]
    fn empty_sides_never_match() {
        assert!(!is_same_contact("", "5521987868395"));
        assert!(!is_same_contact("5521987868395", ""));
        assert!(!is_same_contact("", ""));
        assert!(!is_same_contact("@c.us", "@c.us"));
    }

    #[test]
    fn short_numbers_require_full_suffix() {
        // Below the 8-digit floor only exact/suffix rules apply.
        assert!(!is_same_contact("1234567", "7654321"));
        assert!(is_same_contact("551234567", "1234567"));
    }

    #[test]
    fn display_formats_brazilian_mobile() {
        assert_eq!(
            format_display("5521987868395", "55"),
            "+55 (21) 98786-8395"
        );
        assert_eq!(
            format_display("5521987868395@c.us", "55"),
            "+55 (21) 98786-8395"
        );
    }

    #[test]
    fn display_falls_back_to_digits() {
        assert_eq!(format_display("21987868395", "55"), "21987868395");
        assert_eq!(format_display("", "55"), "");
    }

    #[test]
    fn display_never_affects_matching() {
        let formatted = format_display("5521987868395", "55");
        assert!(is_same_contact(&formatted, "21987868395"));
    }
}
