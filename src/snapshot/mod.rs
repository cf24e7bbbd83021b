//! Snapshots: one captured set of format/value pairs plus metadata.

pub mod content;

pub use content::{ByteContent, ContentValue};

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::format::FormatKey;

/// Name given to snapshots created without one.
pub const UNNAMED: &str = "-unnamed-";

/// `capturedAt` layout, e.g. `2024-03-01 14:22:05`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inserting a format that the snapshot already holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("snapshot already holds content for format {key}")]
pub struct DuplicateFormat {
    pub key: FormatKey,
}

impl DuplicateFormat {
    pub fn identifier(&self) -> &str {
        self.key.primary()
    }
}

/// Format a capture instant in the canonical layout (local time).
pub fn format_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Capture time used when a stream carries none: the Unix epoch.
pub fn default_timestamp() -> String {
    format_timestamp(&DateTime::<Utc>::UNIX_EPOCH)
}

/// One captured clipboard state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    name: String,
    captured_at: String,
    /// Insertion ordered; keys are unique.
    contents: Vec<(FormatKey, ContentValue)>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            name: UNNAMED.to_string(),
            captured_at: default_timestamp(),
            contents: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Empty snapshot with explicit metadata.
    pub fn new(name: impl Into<String>, captured_at: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            captured_at: captured_at.into(),
            contents: Vec::new(),
        }
    }

    /// Empty, unnamed snapshot stamped with the current local time.
    pub fn captured_now() -> Self {
        Self::new(UNNAMED, format_timestamp(&Local::now()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn captured_at(&self) -> &str {
        &self.captured_at
    }

    pub fn contents(&self) -> &[(FormatKey, ContentValue)] {
        &self.contents
    }

    pub fn get(&self, key: &FormatKey) -> Option<&ContentValue> {
        self.contents
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &FormatKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Number of entries an encoder would write.
    pub fn persistable_count(&self) -> usize {
        self.contents
            .iter()
            .filter(|(_, v)| v.is_persistable())
            .count()
    }

    /// Add content under `key`, refusing to overwrite.
    pub fn insert_unique(
        &mut self,
        key: FormatKey,
        value: impl Into<ContentValue>,
    ) -> Result<(), DuplicateFormat> {
        if self.contains(&key) {
            return Err(DuplicateFormat { key });
        }
        self.contents.push((key, value.into()));
        Ok(())
    }
}
