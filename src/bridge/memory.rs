//! In-memory clipboard used by tests.

use std::cell::RefCell;

use crate::format::{FormatKey, FormatRegistry};
use crate::snapshot::ContentValue;

use super::{BridgeError, ClipboardBridge};

/// Clipboard held in a `Vec`, offered as raw identifier lists.
///
/// Identifier lists are resolved on every `current_formats` call, so
/// tests can offer aliases that collapse (or collide) through the
/// registry.
#[derive(Debug, Default)]
pub struct MemoryBridge {
    offered: RefCell<Vec<(Vec<String>, ContentValue)>>,
    written: RefCell<Vec<(FormatKey, ContentValue)>>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `value` under the given identifiers.
    pub fn offer(&self, identifiers: &[&str], value: impl Into<ContentValue>) {
        self.offered.borrow_mut().push((
            identifiers.iter().map(|s| s.to_string()).collect(),
            value.into(),
        ));
    }

    /// Contents passed to the last `write`.
    pub fn written(&self) -> Vec<(FormatKey, ContentValue)> {
        self.written.borrow().clone()
    }
}

impl ClipboardBridge for MemoryBridge {
    fn current_formats(&self, registry: &FormatRegistry) -> Result<Vec<FormatKey>, BridgeError> {
        self.offered
            .borrow()
            .iter()
            .map(|(ids, _)| {
                registry
                    .resolve(ids)
                    .map(|r| r.into_key())
                    .map_err(|e| BridgeError::Clipboard(e.to_string()))
            })
            .collect()
    }

    fn read(&self, format: &FormatKey) -> Result<ContentValue, BridgeError> {
        self.offered
            .borrow()
            .iter()
            .find(|(ids, _)| ids.iter().any(|id| format.contains(id)))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| BridgeError::Unavailable(format.clone()))
    }

    fn write(&self, contents: &[(FormatKey, ContentValue)]) -> Result<(), BridgeError> {
        if contents.is_empty() {
            return Err(BridgeError::NothingToWrite);
        }
        *self.written.borrow_mut() = contents.to_vec();
        Ok(())
    }
}
