//! Snapshot store: the `.ctf` persistence format.
//!
//! A store is a flat stream of framed [`token::Token`]s:
//!
//! ```text
//! FILE_HEADER
//!   (HAS_CONTENT | NO_CONTENT)
//!   [ name capturedAt writableCount
//!       { identifierCount identifier* (bytes cursor | opaque) }* ]
//!   ... one group per snapshot
//! FILE_FOOTER
//! ```
//!
//! [`StoreCodec`] handles the file envelope, [`SnapshotCodec`] each
//! snapshot. [`save`] and [`load`] are the file-level entry points.

pub mod reader;
pub mod snapshot_codec;
pub mod store_codec;
pub mod token;

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::BytesMut;

use crate::format::FormatRegistry;
use crate::snapshot::{DuplicateFormat, Snapshot};

pub use snapshot_codec::{MetadataPolicy, SnapshotCodec};
pub use store_codec::StoreCodec;

/// Store encode/decode and I/O errors.
///
/// Structural variants carry enough context to diagnose a corrupted file
/// without a debugger.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("missing file header: found {observed}")]
    MissingFileHeader { observed: String },
    #[error("stream ended before the file footer (while reading {while_reading})")]
    MissingFileFooter { while_reading: &'static str },
    #[error("missing snapshot header: found {observed}")]
    MissingSnapshotHeader { observed: String },
    #[error("malformed field `{field}`: expected {expected}, found {observed}")]
    MalformedField {
        field: &'static str,
        expected: &'static str,
        observed: String,
    },
    #[error(transparent)]
    DuplicateFormat(#[from] DuplicateFormat),
    #[error("token too large: {0} bytes (max {max})", max = token::MAX_TOKEN_SIZE)]
    TokenTooLarge(usize),
    #[error("count {0} does not fit the integer token")]
    CountOverflow(usize),
    #[error("failed to access {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl StoreError {
    pub(crate) fn malformed(
        field: &'static str,
        expected: &'static str,
        observed: &token::Token,
    ) -> Self {
        StoreError::MalformedField {
            field,
            expected,
            observed: observed.describe(),
        }
    }

    fn file(path: &Path, source: std::io::Error) -> Self {
        StoreError::File {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Non-fatal notices raised while encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A value had no persistable shape and was left out.
    UnpersistableValueSkipped {
        identifier: String,
        type_name: &'static str,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnpersistableValueSkipped {
                identifier,
                type_name,
            } => write!(f, "skipped unpersistable {type_name} value for {identifier}"),
        }
    }
}

/// Summary of a store write.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Snapshots written, including empty ones.
    pub snapshots: usize,
    /// Snapshots written as `NO_CONTENT`.
    pub empty: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Encode `snapshots` and atomically replace the file at `path`.
///
/// The data goes to a temporary file in the same directory, which is
/// renamed over `path` only once fully written and synced.
pub fn save(
    path: &Path,
    snapshots: &[Snapshot],
    policy: MetadataPolicy,
) -> Result<WriteReport, StoreError> {
    let codec = StoreCodec::new(SnapshotCodec::new(policy));
    let (bytes, report) = codec.write(snapshots)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::file(dir, e))?;
    tmp.write_all(&bytes).map_err(|e| StoreError::file(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::file(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::file(path, e.error))?;

    tracing::info!(
        path = %path.display(),
        snapshots = report.snapshots,
        skipped = report.diagnostics.len(),
        bytes = bytes.len(),
        "store saved"
    );
    Ok(report)
}

/// Read every snapshot from the file at `path`.
///
/// Either the whole file decodes or an error is returned; there is no
/// partial result.
pub fn load(path: &Path, registry: &FormatRegistry) -> Result<Vec<Snapshot>, StoreError> {
    let data = std::fs::read(path).map_err(|e| StoreError::file(path, e))?;
    let size = data.len();
    let codec = StoreCodec::default();
    let snapshots = codec.read(BytesMut::from(&data[..]), registry)?;

    tracing::info!(
        path = %path.display(),
        snapshots = snapshots.len(),
        bytes = size,
        "store loaded"
    );
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatKey;
    use crate::snapshot::ContentValue;

    fn sample(name: &str) -> Snapshot {
        let mut s = Snapshot::new(name, "2024-05-01 09:30:00");
        s.insert_unique(FormatKey::single("text/plain").unwrap(), "hello")
            .unwrap();
        s
    }

    #[test]
    fn io_errors_convert() {
        let err = StoreError::from(std::io::Error::other("pipe closed"));
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: pipe closed");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.ctf");
        let snapshots = vec![sample("one"), sample("two")];

        let report = save(&path, &snapshots, MetadataPolicy::Lossy).unwrap();
        assert_eq!(report.snapshots, 2);
        assert!(report.diagnostics.is_empty());

        let loaded = load(&path, &FormatRegistry::with_standard_formats()).unwrap();
        assert_eq!(loaded, snapshots);
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.ctf");
        save(&path, &[sample("old")], MetadataPolicy::Lossy).unwrap();
        save(&path, &[sample("new")], MetadataPolicy::Lossy).unwrap();

        let loaded = load(&path, &FormatRegistry::new()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "new");
    }

    #[test]
    fn save_reports_skipped_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.ctf");
        let mut s = sample("mixed");
        s.insert_unique(
            FormatKey::single("x-native/handle").unwrap(),
            ContentValue::native(17u64),
        )
        .unwrap();

        let report = save(&path, &[s], MetadataPolicy::Lossy).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].to_string().contains("x-native/handle"));
    }

    #[test]
    fn load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ctf");
        let err = load(&path, &FormatRegistry::new()).unwrap_err();
        match err {
            StoreError::File { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/clips.ctf");
        let err = save(&path, &[], MetadataPolicy::Lossy).unwrap_err();
        assert!(matches!(err, StoreError::File { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn load_rejects_non_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.ctf");
        std::fs::write(&path, b"just some text").unwrap();
        let err = load(&path, &FormatRegistry::new()).unwrap_err();
        // "just" read as a length prefix exceeds the token size limit.
        match err {
            StoreError::MissingFileHeader { observed } => {
                assert!(observed.contains("token too large"), "{observed}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
