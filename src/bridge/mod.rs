//! Clipboard bridge: the system clipboard as seen by the toolkit.
//!
//! A bridge lists the formats currently offered, reads each one as an
//! already-classified [`ContentValue`], and hands snapshot contents back
//! for pasting. The toolkit never talks to the platform directly.

#[cfg(test)]
pub mod memory;
pub mod xclip;

pub use xclip::XclipBridge;

use crate::format::{FormatKey, FormatRegistry};
use crate::snapshot::ContentValue;

/// Errors returned by bridge implementations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The platform tool could not be run or failed.
    #[error("clipboard: {0}")]
    Clipboard(String),

    /// The clipboard stopped offering a format between listing and reading.
    #[error("format {0} is not available")]
    Unavailable(FormatKey),

    /// None of the given contents can be placed on this clipboard.
    #[error("nothing transferable to write")]
    NothingToWrite,
}

/// Reads and writes the system clipboard in terms of format keys.
pub trait ClipboardBridge {
    /// Formats currently on the clipboard, resolved against `registry`.
    ///
    /// Targets that resolve to the same key are listed once. A list that
    /// still names one format twice makes the capture fail with a
    /// duplicate.
    fn current_formats(&self, registry: &FormatRegistry) -> Result<Vec<FormatKey>, BridgeError>;

    /// Read and classify the value offered under `format`.
    fn read(&self, format: &FormatKey) -> Result<ContentValue, BridgeError>;

    /// Replace the clipboard with `contents`.
    fn write(&self, contents: &[(FormatKey, ContentValue)]) -> Result<(), BridgeError>;
}
