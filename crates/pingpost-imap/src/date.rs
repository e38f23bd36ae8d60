//! IMAP date formatting.

use chrono::{DateTime, Datelike, Utc};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Formats a timestamp as an RFC 3501 search date (`2-Jan-2026`).
///
/// SEARCH dates carry no time component; the server compares against
/// the message's internal date in its own timezone.
#[must_use]
pub fn imap_date(when: DateTime<Utc>) -> String {
    let month = MONTHS[(when.month0() as usize).min(11)];
    format!("{}-{}-{}", when.day(), month, when.year())
}
