//! X11 clipboard bridge over the `xclip` command.
//!
//! Lists the selection's `TARGETS`, reads each target with
//! `xclip -o -t <target>`, and pastes one entry with `xclip -i -t <target>`.
//! `xclip` can own only a single target, so pasting a multi-format
//! snapshot keeps its first transferable entry.
//!
//! Targets such as `PIXMAP` carry X resource ids that mean nothing once
//! the server session ends. They are captured as native values: usable
//! for pasting within the process, never written to a store.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::format::{FormatKey, FormatRegistry};
use crate::snapshot::ContentValue;

use super::{BridgeError, ClipboardBridge};

/// X11 bookkeeping targets that carry no content.
const META_TARGETS: &[&str] = &[
    "TARGETS",
    "TIMESTAMP",
    "MULTIPLE",
    "SAVE_TARGETS",
    "DELETE",
    "INSERT_SELECTION",
    "INSERT_PROPERTY",
];

/// Targets whose data is an id of a live X server resource.
const RESOURCE_TARGETS: &[&str] = &["PIXMAP", "BITMAP", "DRAWABLE", "WINDOW", "COLORMAP"];

/// Raw data of a resource target, only meaningful in the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XResource {
    pub target: String,
    pub data: Vec<u8>,
}

/// Targets read as text rather than raw bytes.
fn is_textual(target: &str) -> bool {
    target.starts_with("text/")
        || matches!(target, "UTF8_STRING" | "STRING" | "TEXT" | "COMPOUND_TEXT")
}

/// `ClipboardBridge` backed by the `xclip` command.
#[derive(Debug, Clone)]
pub struct XclipBridge {
    selection: String,
}

impl XclipBridge {
    pub fn new(selection: impl Into<String>) -> Self {
        Self {
            selection: selection.into(),
        }
    }

    fn output(&self, target: &str) -> Result<Vec<u8>, BridgeError> {
        let output = Command::new("xclip")
            .args(["-selection", &self.selection, "-o", "-t", target])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| BridgeError::Clipboard(format!("failed to spawn xclip -o: {e}")))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(BridgeError::Clipboard(format!(
                "xclip -o -t {target} exited with status {}",
                output.status
            )))
        }
    }

    fn input(&self, target: &str, content: &[u8]) -> Result<(), BridgeError> {
        let mut child = Command::new("xclip")
            .args(["-selection", &self.selection, "-i", "-t", target])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::Clipboard(format!("failed to spawn xclip: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(content)
                .map_err(|e| BridgeError::Clipboard(format!("failed to write to xclip: {e}")))?;
            // Drop stdin to close the pipe so xclip can finish.
        }

        let status = child
            .wait()
            .map_err(|e| BridgeError::Clipboard(format!("failed to wait for xclip: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(BridgeError::Clipboard(format!(
                "xclip exited with status {status}"
            )))
        }
    }
}

impl ClipboardBridge for XclipBridge {
    fn current_formats(&self, registry: &FormatRegistry) -> Result<Vec<FormatKey>, BridgeError> {
        let listing = self.output("TARGETS")?;
        let listing = String::from_utf8_lossy(&listing);
        Ok(keys_from_targets(listing.lines(), registry))
    }

    fn read(&self, format: &FormatKey) -> Result<ContentValue, BridgeError> {
        let data = self
            .output(format.primary())
            .map_err(|_| BridgeError::Unavailable(format.clone()))?;
        Ok(classify(format, data))
    }

    fn write(&self, contents: &[(FormatKey, ContentValue)]) -> Result<(), BridgeError> {
        let (target, data) = contents
            .iter()
            .find_map(|(key, value)| transfer_bytes(value).map(|data| (key.primary(), data)))
            .ok_or(BridgeError::NothingToWrite)?;

        tracing::debug!(format = target, bytes = data.len(), "writing clipboard");
        self.input(target, &data)
    }
}

/// Resolve target names into distinct keys, dropping meta targets.
fn keys_from_targets<'a>(
    targets: impl Iterator<Item = &'a str>,
    registry: &FormatRegistry,
) -> Vec<FormatKey> {
    let mut keys: Vec<FormatKey> = Vec::new();
    for target in targets.map(str::trim) {
        if target.is_empty() || META_TARGETS.contains(&target) {
            continue;
        }
        let Ok(resolution) = registry.resolve(&[target]) else {
            continue;
        };
        let key = resolution.into_key();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Text targets become strings when they decode as UTF-8.
fn classify(format: &FormatKey, data: Vec<u8>) -> ContentValue {
    if let Some(target) = format
        .identifiers()
        .iter()
        .find(|id| RESOURCE_TARGETS.contains(&id.as_str()))
    {
        return ContentValue::native(XResource {
            target: target.clone(),
            data,
        });
    }
    if format.identifiers().iter().any(|id| is_textual(id)) {
        match String::from_utf8(data) {
            Ok(text) => return ContentValue::from(text),
            Err(e) => return ContentValue::from(e.into_bytes()),
        }
    }
    ContentValue::from(data)
}

/// Bytes to hand to `xclip` for a value, if it has any.
fn transfer_bytes(value: &ContentValue) -> Option<Vec<u8>> {
    match value {
        ContentValue::Bytes(b) => Some(b.remaining().to_vec()),
        ContentValue::Opaque(serde_json::Value::String(s)) => Some(s.clone().into_bytes()),
        ContentValue::Opaque(other) => serde_json::to_vec(other).ok(),
        ContentValue::NonPersistable(handle) => {
            handle.downcast_ref::<XResource>().map(|r| r.data.clone())
        }
    }
}
