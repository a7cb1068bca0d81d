//! A single detected secret occurrence.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// One occurrence of a pattern in a span.
///
/// `start`/`end` are byte offsets of the captured value. The raw value is
/// only reachable through [`Finding::raw_value`]; `Debug` and serialization
/// show [`Finding::redacted_preview`] instead.
#[derive(Clone, PartialEq, Eq)]
pub struct Finding {
    pub pattern: String,
    pub category: String,
    pub start: usize,
    pub end: usize,
    /// Bundle entry the finding came from, when scanning a bundle.
    pub entry: Option<String>,
    raw_value: String,
}

impl Finding {
    pub fn new(
        pattern: impl Into<String>,
        category: impl Into<String>,
        start: usize,
        end: usize,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
            start,
            end,
            entry: None,
            raw_value: raw_value.into(),
        }
    }

    /// Attach the bundle entry name.
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    /// The matched secret. Never log or persist this.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Length of the captured value in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// A preview safe for logs and reports.
    pub fn redacted_preview(&self) -> String {
        if self.raw_value.chars().count() <= 8 {
            "[REDACTED]".to_string()
        } else {
            let head: String = self.raw_value.chars().take(4).collect();
            format!("{}...[REDACTED]", head)
        }
    }
}

impl fmt::Debug for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finding")
            .field("pattern", &self.pattern)
            .field("category", &self.category)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("entry", &self.entry)
            .field("preview", &self.redacted_preview())
            .finish()
    }
}

impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Finding", 6)?;
        s.serialize_field("pattern", &self.pattern)?;
        s.serialize_field("category", &self.category)?;
        s.serialize_field("start", &self.start)?;
        s.serialize_field("end", &self.end)?;
        s.serialize_field("entry", &self.entry)?;
        s.serialize_field("preview", &self.redacted_preview())?;
        s.end()
    }
}
