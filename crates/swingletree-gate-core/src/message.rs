//! Message bodies shared by the gate, its plugins and the installation service.
//!
//! Every failure response carries an [`ErrorMessage`]:
//!
//! ```json
//! { "errors": [ { "title": "Plugin not found", "detail": "..." } ] }
//! ```
//!
//! Plugins answer failed report deliveries with the same shape, which lets the
//! gate relay their entries to its own caller unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `{title, detail}` error record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub title: String,

    /// Downstream services are not required to send a detail.
    #[serde(default)]
    pub detail: String,
}

impl ErrorEntry {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(&self.title)
        } else {
            write!(f, "{}: {}", self.title, self.detail)
        }
    }
}

/// Ordered list of error entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

impl ErrorMessage {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message holding one entry.
    pub fn single(entry: ErrorEntry) -> Self {
        Self {
            errors: vec![entry],
        }
    }

    /// Append one entry, returning the message for chaining.
    pub fn push(mut self, entry: ErrorEntry) -> Self {
        self.errors.push(entry);
        self
    }

    /// Append all entries in order, returning the message for chaining.
    pub fn extend(mut self, entries: impl IntoIterator<Item = ErrorEntry>) -> Self {
        self.errors.extend(entries);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check whether any entry carries the given title.
    pub fn contains_title(&self, title: &str) -> bool {
        self.errors.iter().any(|e| e.title == title)
    }
}

impl From<ErrorEntry> for ErrorMessage {
    fn from(entry: ErrorEntry) -> Self {
        Self::single(entry)
    }
}

impl FromIterator<ErrorEntry> for ErrorMessage {
    fn from_iter<I: IntoIterator<Item = ErrorEntry>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// Success body without content. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyMessage {}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
