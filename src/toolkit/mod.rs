//! Clipboard toolkit: the owned snapshot collection.
//!
//! [`ClipboardToolkit`] is the only thing a front end talks to. It owns
//! the snapshots and the format registry. The store layer only borrows
//! them for the length of a save or load.

use std::path::Path;

use crate::bridge::{BridgeError, ClipboardBridge};
use crate::format::FormatRegistry;
use crate::snapshot::{DuplicateFormat, Snapshot};
use crate::store::{self, MetadataPolicy, StoreError, WriteReport};

/// Toolkit errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    #[error("no snapshot at index {index} ({len} stored)")]
    NoSuchSnapshot { index: usize, len: usize },
    #[error("capture aborted: {0}")]
    Capture(#[from] DuplicateFormat),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the in-memory snapshot collection.
#[derive(Debug)]
pub struct ClipboardToolkit {
    snapshots: Vec<Snapshot>,
    registry: FormatRegistry,
    policy: MetadataPolicy,
}

impl Default for ClipboardToolkit {
    fn default() -> Self {
        Self::new(MetadataPolicy::default())
    }
}

impl ClipboardToolkit {
    /// Empty toolkit with the standard formats registered.
    pub fn new(policy: MetadataPolicy) -> Self {
        Self {
            snapshots: Vec::new(),
            registry: FormatRegistry::with_standard_formats(),
            policy,
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn get(&self, index: usize) -> Result<&Snapshot, ToolkitError> {
        self.snapshots.get(index).ok_or(ToolkitError::NoSuchSnapshot {
            index,
            len: self.snapshots.len(),
        })
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Snapshot, ToolkitError> {
        let len = self.snapshots.len();
        self.snapshots
            .get_mut(index)
            .ok_or(ToolkitError::NoSuchSnapshot { index, len })
    }

    /// Capture the bridge's current contents as a new snapshot.
    ///
    /// The snapshot is appended only if every format was read and
    /// inserted; a duplicate format aborts the capture.
    pub fn capture(
        &mut self,
        bridge: &dyn ClipboardBridge,
        name: Option<&str>,
    ) -> Result<&Snapshot, ToolkitError> {
        let mut snapshot = Snapshot::captured_now();
        if let Some(name) = name {
            snapshot.set_name(name);
        }

        for key in bridge.current_formats(&self.registry)? {
            let value = bridge.read(&key)?;
            tracing::debug!(format = %key, kind = value.kind(), "captured format");
            snapshot.insert_unique(key, value).inspect_err(|e| {
                tracing::warn!(format = e.identifier(), "format offered twice, capture aborted");
            })?;
        }

        tracing::info!(
            name = snapshot.name(),
            formats = snapshot.len(),
            "snapshot captured"
        );
        self.snapshots.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    /// Put a stored snapshot back on the clipboard.
    pub fn paste(&self, index: usize, bridge: &dyn ClipboardBridge) -> Result<(), ToolkitError> {
        let snapshot = self.get(index)?;
        bridge.write(snapshot.contents())?;
        tracing::info!(index, name = snapshot.name(), "snapshot pasted");
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<(), ToolkitError> {
        self.get_mut(index)?.set_name(name);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Snapshot, ToolkitError> {
        let len = self.snapshots.len();
        if index >= len {
            return Err(ToolkitError::NoSuchSnapshot { index, len });
        }
        Ok(self.snapshots.remove(index))
    }

    /// Write every snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<WriteReport, ToolkitError> {
        let report = store::save(path, &self.snapshots, self.policy)?;
        for diagnostic in &report.diagnostics {
            tracing::warn!(%diagnostic, "not saved");
        }
        Ok(report)
    }

    /// Replace the collection with the snapshots stored at `path`.
    ///
    /// On error the current collection is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<&[Snapshot], ToolkitError> {
        let loaded = store::load(path, &self.registry)?;

        for snapshot in &loaded {
            for (key, _) in snapshot.contents() {
                if !self.registry.is_registered(key) {
                    self.registry.adopt(key);
                }
            }
        }
        tracing::debug!(formats = self.registry.len(), "format registry after load");
        self.snapshots = loaded;
        Ok(&self.snapshots)
    }
}
