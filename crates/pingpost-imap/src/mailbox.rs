//! Sent-folder candidate names and adaptive prefix negotiation.
//!
//! Providers disagree on where sent mail lives: some expose
//! `INBOX.Sent`, some a bare `Sent`, some a localized or
//! provider-specific path. The archiver walks a fixed candidate list,
//! and when a server's rejection text names a required prefix, a
//! corrected candidate is constructed and tried ahead of the rest.

/// Base names tried for the sent folder, in priority order.
const SENT_NAMES: &[&str] = &[
    "Sent",
    "Sent Messages",
    "Sent Items",
    "Gesendet",
    "[Gmail]/Sent Mail",
];

/// Namespace prefixes a candidate may already carry.
const KNOWN_PREFIXES: &[&str] = &["INBOX.", "INBOX/"];

/// Returns the sent-folder candidates in priority order:
/// `INBOX.`-prefixed variants first, then the bare names.
#[must_use]
pub fn sent_candidates() -> Vec<String> {
    let mut candidates = Vec::with_capacity(SENT_NAMES.len() * 2);
    for name in SENT_NAMES {
        candidates.push(format!("INBOX.{name}"));
    }
    for name in SENT_NAMES {
        candidates.push((*name).to_string());
    }
    candidates
}

/// Extracts a required mailbox prefix from a server rejection text.
///
/// Matches the phrase `prefixed with: <prefix>` (case-insensitive) that
/// some servers embed in APPEND rejections, e.g.
/// `A0001 NO [CANNOT] Mailbox names must be prefixed with: INBOX.`.
///
/// Pure string inspection, no I/O.
#[must_use]
pub fn prefix_hint(response: &str) -> Option<String> {
    let marker = b"prefixed with:";
    let at = response
        .as_bytes()
        .windows(marker.len())
        .position(|w| w.eq_ignore_ascii_case(marker))?;
    // The matched window is pure ASCII, so the slice is on a char boundary.
    let rest = &response[at + marker.len()..];
    let prefix: String = rest
        .trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != ']' && *c != ')')
        .collect();
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Strips any known namespace prefix, leaving the bare folder name.
#[must_use]
pub fn bare_name(candidate: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        if let Some(rest) = candidate.strip_prefix(prefix) {
            return rest;
        }
    }
    candidate
}

/// Builds the corrected mailbox name for a hinted prefix.
///
/// The hint replaces whatever namespace the rejected candidate carried.
#[must_use]
pub fn apply_prefix(hint: &str, rejected_candidate: &str) -> String {
    format!("{hint}{}", bare_name(rejected_candidate))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_prefixed_first() {
        let candidates = sent_candidates();
        assert_eq!(candidates[0], "INBOX.Sent");
        assert!(candidates.iter().position(|c| c == "Sent").unwrap() >= SENT_NAMES.len());
        assert_eq!(candidates.len(), SENT_NAMES.len() * 2);
    }

    #[test]
    fn test_prefix_hint_extracted() {
        let response = "A0001 NO [CANNOT] Mailbox names must be prefixed with: INBOX.\r\n";
        assert_eq!(prefix_hint(response).unwrap(), "INBOX.");
    }

    #[test]
    fn test_prefix_hint_case_insensitive() {
        let response = "A0002 NO folder must be Prefixed With: Mail/";
        assert_eq!(prefix_hint(response).unwrap(), "Mail/");
    }

    #[test]
    fn test_prefix_hint_absent() {
        assert!(prefix_hint("A0001 NO no such mailbox").is_none());
        assert!(prefix_hint("").is_none());
        assert!(prefix_hint("prefixed with: ").is_none());
    }

    #[test]
    fn test_apply_prefix() {
        assert_eq!(apply_prefix("INBOX.", "Sent"), "INBOX.Sent");
        assert_eq!(apply_prefix("INBOX.", "INBOX/Sent Items"), "INBOX.Sent Items");
        assert_eq!(apply_prefix("Mail/", "INBOX.Sent"), "Mail/Sent");
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("INBOX.Sent"), "Sent");
        assert_eq!(bare_name("INBOX/Sent"), "Sent");
        assert_eq!(bare_name("Sent Messages"), "Sent Messages");
    }
}
