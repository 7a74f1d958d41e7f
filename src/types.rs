//! Core shared types for the panelnotes application.
//!
//! This module contains the result alias, mutation outcomes, the export
//! payload shape, and the CLI command surface.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::{Note, PanelError};

/// A specialized Result type for panelnotes operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Outcome of a best-effort mutation that targets a note by id.
///
/// Stale references from the UI layer are expected; operations aimed at a
/// note that no longer exists report `UnknownId` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation was applied and persisted
    Applied,
    /// The input was rejected without touching any state
    Ignored,
    /// No note with the requested id exists; nothing changed
    UnknownId,
}

/// On-disk shape of an exported note collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Every note in display order
    pub notes: Vec<Note>,
    /// Id of the note that was active at export time
    #[serde(rename = "activeNoteId")]
    pub active_note_id: Option<String>,
    /// When the export was produced
    #[serde(rename = "exportedAt")]
    pub exported_at: DateTime<Utc>,
    /// Payload format version
    pub version: u32,
}

/// Summary of an import operation.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    /// Number of notes accepted into the collection
    pub notes_imported: usize,
    /// Number of entries dropped for missing or malformed fields
    pub entries_dropped: usize,
    /// Id of the note that became active after the import
    pub active_note_id: Option<String>,
}

/// Available subcommands for the panelnotes application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note and switch to it
    New {
        /// Create a rich-text note instead of a plain one
        #[clap(short, long)]
        rich: bool,

        /// Title for the note (defaults to "New note N")
        #[clap(short = 'T', long)]
        title: Option<String>,
    },

    /// List saved notes
    List {
        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Switch the active note
    Open {
        /// ID of the note to activate
        id: String,
    },

    /// Rename a note
    Rename {
        /// ID of the note to rename
        id: String,

        /// New title for the note
        title: String,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Replace a note's content
    Write {
        /// New content for the note
        content: Option<String>,

        /// Path to a file containing the new content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Target note ID (defaults to the active note)
        #[clap(short, long)]
        id: Option<String>,
    },

    /// Print a note as extracted text or a rendered HTML document
    Show {
        /// ID of the note to show (defaults to the active note)
        id: Option<String>,

        /// Render an HTML document instead of plain text
        #[clap(long)]
        html: bool,
    },

    /// Export all notes to a JSON backup file
    Export {
        /// Path for the backup file (default is notepad-backup-<date>.json)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Import notes from a JSON backup file
    Import {
        /// Path to the backup file
        input: PathBuf,
    },
}
