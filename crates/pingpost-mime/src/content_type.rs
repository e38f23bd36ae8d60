//! Content-Type values for generated messages.

use std::fmt;

/// Content type of a message or part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    /// `text/plain; charset=utf-8`
    TextPlain,
    /// `text/html; charset=utf-8`
    TextHtml,
    /// `multipart/mixed` with the given boundary.
    MultipartMixed {
        /// Boundary token delimiting the parts.
        boundary: String,
    },
}

impl ContentType {
    /// Returns true if this is a multipart type.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::MultipartMixed { .. })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextPlain => write!(f, "text/plain; charset=utf-8"),
            Self::TextHtml => write!(f, "text/html; charset=utf-8"),
            Self::MultipartMixed { boundary } => {
                write!(f, "multipart/mixed; boundary=\"{boundary}\"")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ContentType::TextPlain.to_string(), "text/plain; charset=utf-8");
        assert_eq!(ContentType::TextHtml.to_string(), "text/html; charset=utf-8");
        assert_eq!(
            ContentType::MultipartMixed {
                boundary: "b1".into()
            }
            .to_string(),
            "multipart/mixed; boundary=\"b1\""
        );
    }
}
