use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cliptk", about = "Capture, store and restore clipboard snapshots")]
pub struct Cli {
    /// Snapshot store file (.ctf). Defaults to $XDG_DATA_HOME/cliptk/snapshots.ctf
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// X11 selection to capture from and paste into
    #[arg(long, global = true, default_value = "clipboard")]
    pub selection: String,

    /// Keep name and capture time of snapshots with no storable content
    #[arg(long, global = true)]
    pub preserve_empty_metadata: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Capture the current clipboard into the store
    Capture {
        /// Display name for the new snapshot
        #[arg(long)]
        name: Option<String>,
    },

    /// List stored snapshots
    List,

    /// Show the formats held by one snapshot
    Show {
        /// Snapshot index as printed by `list`
        index: usize,
    },

    /// Put a stored snapshot back on the clipboard
    Paste {
        /// Snapshot index as printed by `list`
        index: usize,
    },

    /// Rename a stored snapshot
    Rename {
        /// Snapshot index as printed by `list`
        index: usize,

        /// New display name
        name: String,
    },

    /// Delete a stored snapshot
    Remove {
        /// Snapshot index as printed by `list`
        index: usize,
    },
}

impl Command {
    /// Subcommand name, used to prefix error output.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Capture { .. } => "capture",
            Command::List => "list",
            Command::Show { .. } => "show",
            Command::Paste { .. } => "paste",
            Command::Rename { .. } => "rename",
            Command::Remove { .. } => "remove",
        }
    }
}
