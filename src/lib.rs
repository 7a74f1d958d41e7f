//! Side-panel note-taking core library
//!
//! This library provides the persistence and editor-synchronization model
//! behind a note-taking side panel: a key/value store adapter, a note
//! repository enforcing the single-active-note and draft lifecycle rules,
//! a bridge to the two editing surfaces, and a debounced autosave runtime.

mod autosave;
mod cli;
mod config;
mod document;
mod editor;
mod errors;
mod import;
mod note;
mod repository;
mod store;
mod types;

// Re-export key components
pub use autosave::*;
pub use cli::*;
pub use config::*;
pub use document::*;
pub use editor::*;
pub use errors::*;
pub use import::*;
pub use note::*;
pub use repository::*;
pub use store::*;
pub use types::*;
