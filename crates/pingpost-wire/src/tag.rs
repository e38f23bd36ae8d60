//! Command tag generator.
//!
//! Tags correlate a command with its eventual terminal response line.
//! Sessions are single-connection and short-lived, so sequential tags
//! are unique where it matters; reuse across sessions is harmless.

use std::sync::atomic::{AtomicU32, Ordering};

/// Sequential tag generator in the format "A0000", "A0001", ...
#[derive(Debug)]
pub struct TagGenerator {
    counter: AtomicU32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self {
            counter: AtomicU32::new(0),
            prefix,
        }
    }

    /// Generates the next tag.
    #[must_use]
    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{:04}", self.prefix, n)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}
