//! SMTP response parser.

use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyCode};

/// Parses an SMTP reply from response lines.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK`
/// - Multi: `250-First line`, `250-Second line`, `250 Last line`
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    if lines.is_empty() {
        return Err(Error::Protocol("Empty reply".into()));
    }

    let first = &lines[0];
    let code_str = first
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {first}")))?;
    let code = code_str
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code_str}")))?;

    let mut message = Vec::new();
    for line in lines {
        if let Some(text) = line.get(4..) {
            // Skip code and separator ("250-" or "250 ")
            message.push(text.to_string());
        } else if line.len() == 3 {
            message.push(String::new());
        } else {
            return Err(Error::Protocol(format!("Malformed reply line: {line}")));
        }
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Multi-line replies use `-` after the code for continuation and a
/// space for the final line. A bare three-digit line is also final.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    (line.len() >= 4 && line.as_bytes()[3] == b' ') || line.len() == 3
}
