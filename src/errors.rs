//! Error types for the panelnotes application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during note persistence and editor synchronization.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the panelnotes application.
#[derive(Error, Debug)]
pub enum PanelError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when performing an operation that must resolve it.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Import payload whose top-level shape cannot be used.
    #[error("Invalid import payload: {reason}")]
    InvalidImport { reason: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },
}
