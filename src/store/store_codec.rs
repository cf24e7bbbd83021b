//! File envelope: `FILE_HEADER snapshot* FILE_FOOTER`.

use bytes::BytesMut;

use crate::format::FormatRegistry;
use crate::snapshot::Snapshot;

use super::reader::{TokenReader, TokenWriter, field};
use super::snapshot_codec::SnapshotCodec;
use super::token::{Sentinel, Token};
use super::{StoreError, WriteReport};

/// Encodes and decodes a whole store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCodec {
    snapshot: SnapshotCodec,
}

impl StoreCodec {
    pub fn new(snapshot: SnapshotCodec) -> Self {
        Self { snapshot }
    }

    /// Encode `snapshots` in order.
    pub fn write(&self, snapshots: &[Snapshot]) -> Result<(BytesMut, WriteReport), StoreError> {
        let mut out = TokenWriter::new();
        let mut report = WriteReport::default();

        out.sentinel(Sentinel::FileHeader)?;
        for snapshot in snapshots {
            let outcome = self.snapshot.encode(snapshot, &mut out)?;
            report.snapshots += 1;
            if outcome.empty {
                report.empty += 1;
            }
            report.diagnostics.extend(outcome.diagnostics);
        }
        out.sentinel(Sentinel::FileFooter)?;

        tracing::debug!(
            snapshots = report.snapshots,
            tokens = out.written(),
            "store encoded"
        );
        Ok((out.into_bytes(), report))
    }

    /// Decode every snapshot in `data`.
    ///
    /// All-or-nothing: any structural error discards what was decoded so
    /// far.
    pub fn read(
        &self,
        data: BytesMut,
        registry: &FormatRegistry,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let mut reader = TokenReader::new(data);

        // Whatever stops the first token from being the header, the file
        // is not a store.
        match reader.try_next() {
            Ok(Some(Token::Sentinel(Sentinel::FileHeader))) => {}
            Ok(Some(other)) => {
                return Err(StoreError::MissingFileHeader {
                    observed: other.describe(),
                });
            }
            Ok(None) => {
                return Err(StoreError::MissingFileHeader {
                    observed: "end of stream".to_string(),
                });
            }
            Err(e) => {
                return Err(StoreError::MissingFileHeader {
                    observed: e.to_string(),
                });
            }
        }

        let mut snapshots = Vec::new();
        while reader.peek(field::SNAPSHOT_HEADER)? != &Token::Sentinel(Sentinel::FileFooter) {
            snapshots.push(self.snapshot.decode(&mut reader, registry)?);
        }
        reader.next(field::SNAPSHOT_HEADER)?;

        if reader.remaining_bytes() > 0 {
            tracing::warn!(
                after_tokens = reader.position(),
                bytes = reader.remaining_bytes(),
                "ignoring data after file footer"
            );
        }

        Ok(snapshots)
    }
}
