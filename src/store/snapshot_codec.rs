//! Per-snapshot framing.
//!
//! ```text
//! NO_CONTENT
//! | HAS_CONTENT name capturedAt writableCount
//!     { identifierCount identifier* (bytes cursor | opaque) } * writableCount
//! ```

use crate::format::{FormatKey, FormatRegistry, RegistryError};
use crate::snapshot::{ByteContent, ContentValue, Snapshot};

use super::reader::{TokenReader, TokenWriter, field};
use super::token::{Sentinel, Token};
use super::{Diagnostic, StoreError};

/// What to write for a snapshot with nothing persistable in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataPolicy {
    /// Write only `NO_CONTENT`. Name and capture time are lost and come
    /// back as defaults.
    #[default]
    Lossy,
    /// Write the full frame with a zero entry count so name and capture
    /// time survive.
    Preserve,
}

/// Result of encoding one snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// Entries written.
    pub written: usize,
    /// True when only `NO_CONTENT` was written.
    pub empty: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Encodes and decodes a single [`Snapshot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotCodec {
    policy: MetadataPolicy,
}

impl SnapshotCodec {
    pub fn new(policy: MetadataPolicy) -> Self {
        Self { policy }
    }

    pub fn encode(
        &self,
        snapshot: &Snapshot,
        out: &mut TokenWriter,
    ) -> Result<EncodeOutcome, StoreError> {
        let mut diagnostics = Vec::new();
        let mut writable: Vec<(&FormatKey, &ContentValue)> = Vec::new();
        for (key, value) in snapshot.contents() {
            match value {
                ContentValue::NonPersistable(handle) => {
                    tracing::warn!(
                        format = %key,
                        value_type = handle.type_name(),
                        "value is not persistable, skipping"
                    );
                    diagnostics.push(Diagnostic::UnpersistableValueSkipped {
                        identifier: key.primary().to_string(),
                        type_name: handle.type_name(),
                    });
                }
                _ => writable.push((key, value)),
            }
        }

        if writable.is_empty() && self.policy == MetadataPolicy::Lossy {
            tracing::warn!(
                name = snapshot.name(),
                "snapshot has no persistable content, writing empty marker"
            );
            out.sentinel(Sentinel::NoContent)?;
            return Ok(EncodeOutcome {
                written: 0,
                empty: true,
                diagnostics,
            });
        }

        out.sentinel(Sentinel::HasContent)?;
        out.str(snapshot.name())?;
        out.str(snapshot.captured_at())?;
        out.count(writable.len())?;

        for (key, value) in &writable {
            out.count(key.identifiers().len())?;
            for id in key.identifiers() {
                out.str(id)?;
            }
            match value {
                ContentValue::Bytes(b) => {
                    out.write(Token::Bytes(b.payload().to_vec()))?;
                    out.count(b.cursor())?;
                }
                ContentValue::Opaque(v) => out.write(Token::Opaque(v.clone()))?,
                ContentValue::NonPersistable(_) => {}
            }
        }

        tracing::debug!(
            name = snapshot.name(),
            entries = writable.len(),
            skipped = diagnostics.len(),
            "snapshot encoded"
        );
        Ok(EncodeOutcome {
            written: writable.len(),
            empty: false,
            diagnostics,
        })
    }

    /// Decode a snapshot starting at its header token.
    pub fn decode(
        &self,
        reader: &mut TokenReader,
        registry: &FormatRegistry,
    ) -> Result<Snapshot, StoreError> {
        match reader.next(field::SNAPSHOT_HEADER)? {
            Token::Sentinel(Sentinel::NoContent) => return Ok(Snapshot::default()),
            Token::Sentinel(Sentinel::HasContent) => {}
            other => {
                return Err(StoreError::MissingSnapshotHeader {
                    observed: other.describe(),
                });
            }
        }

        let name = reader.read_str(field::NAME)?;
        let captured_at = reader.read_str(field::CAPTURED_AT)?;
        let writable = reader.read_count(field::WRITABLE_COUNT)?;

        let mut snapshot = Snapshot::new(name, captured_at);
        for _ in 0..writable {
            let key = read_format_key(reader, registry)?;
            let value = read_payload(reader)?;
            snapshot.insert_unique(key, value)?;
        }

        tracing::debug!(
            name = snapshot.name(),
            entries = snapshot.len(),
            "snapshot decoded"
        );
        Ok(snapshot)
    }
}

fn read_format_key(
    reader: &mut TokenReader,
    registry: &FormatRegistry,
) -> Result<FormatKey, StoreError> {
    let count = reader.read_count(field::IDENTIFIER_COUNT)?;
    if count == 0 {
        return Err(StoreError::MalformedField {
            field: field::IDENTIFIER_COUNT,
            expected: "positive integer",
            observed: Token::Int(0).describe(),
        });
    }

    let mut identifiers = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let id = reader.read_str(field::IDENTIFIER)?;
        if id.is_empty() {
            return Err(StoreError::MalformedField {
                field: field::IDENTIFIER,
                expected: "non-empty string",
                observed: "empty string".to_string(),
            });
        }
        identifiers.push(id);
    }

    let resolution = registry.resolve(&identifiers).map_err(|e| match e {
        RegistryError::NoIdentifiers => StoreError::MalformedField {
            field: field::IDENTIFIER_COUNT,
            expected: "positive integer",
            observed: Token::Int(0).describe(),
        },
        other => StoreError::MalformedField {
            field: field::IDENTIFIER,
            expected: "non-empty string",
            observed: other.to_string(),
        },
    })?;
    if !resolution.is_canonical() {
        tracing::debug!(format = %resolution.key(), "format not registered");
    }
    Ok(resolution.into_key())
}

fn read_payload(reader: &mut TokenReader) -> Result<ContentValue, StoreError> {
    match reader.next(field::PAYLOAD)? {
        Token::Bytes(payload) => {
            let len = payload.len();
            let raw = reader.read_int(field::CURSOR)?;
            let cursor = usize::try_from(raw)
                .ok()
                .filter(|&c| c <= len)
                .ok_or_else(|| StoreError::MalformedField {
                    field: field::CURSOR,
                    expected: "offset within the payload",
                    observed: format!("integer {raw} for a {len}-byte payload"),
                })?;
            let content = ByteContent::new(payload, cursor).map_err(|e| StoreError::MalformedField {
                field: field::CURSOR,
                expected: "offset within the payload",
                observed: e.to_string(),
            })?;
            Ok(ContentValue::Bytes(content))
        }
        Token::Opaque(value) => Ok(ContentValue::Opaque(value)),
        other => Err(StoreError::malformed(
            field::PAYLOAD,
            "byte sequence or opaque value",
            &other,
        )),
    }
}
