//! One-shot CLI commands over a snapshot store.
//!
//! Each command loads the store (if it exists), performs one toolkit
//! operation, saves when something changed, prints the result and exits.

mod format;

use std::path::{Path, PathBuf};

use crate::bridge::XclipBridge;
use crate::cli::{Cli, Command};
use crate::store::MetadataPolicy;
use crate::toolkit::{ClipboardToolkit, ToolkitError};

/// File extension required for store files.
pub const STORE_EXTENSION: &str = "ctf";

/// Command errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("neither $XDG_DATA_HOME nor $HOME is set")]
    NoDataDir,
    #[error("store file must have a .{STORE_EXTENSION} extension: {0}")]
    BadExtension(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Toolkit(#[from] ToolkitError),
}

/// Run the parsed command line.
pub fn run(cli: Cli) -> Result<(), CommandError> {
    let store = match cli.store {
        Some(path) => path,
        None => default_store_path()?,
    };
    check_extension(&store)?;

    let policy = if cli.preserve_empty_metadata {
        MetadataPolicy::Preserve
    } else {
        MetadataPolicy::Lossy
    };
    let bridge = XclipBridge::new(cli.selection);

    let mut toolkit = ClipboardToolkit::new(policy);
    if store.exists() {
        toolkit.load(&store)?;
    }

    match cli.command {
        Command::Capture { name } => {
            let snapshot = toolkit.capture(&bridge, name.as_deref())?;
            format::print_captured(snapshot);
            let index = toolkit.snapshots().len() - 1;
            ensure_parent(&store)?;
            let report = toolkit.save(&store)?;
            format::print_saved(index, &report);
        }
        Command::List => {
            format::print_snapshots(toolkit.snapshots());
        }
        Command::Show { index } => {
            format::print_contents(index, toolkit.get(index)?);
        }
        Command::Paste { index } => {
            toolkit.paste(index, &bridge)?;
            format::print_pasted(index);
        }
        Command::Rename { index, name } => {
            toolkit.rename(index, name)?;
            toolkit.save(&store)?;
            format::print_renamed(index, toolkit.get(index)?);
        }
        Command::Remove { index } => {
            let removed = toolkit.remove(index)?;
            toolkit.save(&store)?;
            format::print_removed(index, &removed);
        }
    }

    Ok(())
}

/// Resolve the default store path from `$XDG_DATA_HOME` or `$HOME`.
fn default_store_path() -> Result<PathBuf, CommandError> {
    let data_dir = match std::env::var_os("XDG_DATA_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let home = std::env::var_os("HOME").ok_or(CommandError::NoDataDir)?;
            PathBuf::from(home).join(".local").join("share")
        }
    };
    Ok(data_dir
        .join("cliptk")
        .join(format!("snapshots.{STORE_EXTENSION}")))
}

fn check_extension(path: &Path) -> Result<(), CommandError> {
    match path.extension() {
        Some(ext) if ext == STORE_EXTENSION => Ok(()),
        _ => Err(CommandError::BadExtension(path.to_path_buf())),
    }
}

/// Create the store's directory on first save.
fn ensure_parent(path: &Path) -> Result<(), CommandError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| CommandError::MkdirFailed {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}
