//! Core data structures for the panelnotes application.
//!
//! This module contains the note record persisted in the key/value store and
//! the id-generation helpers shared by the repository.
use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix for regular note ids.
pub const NOTE_ID_PREFIX: &str = "note";

/// Prefix for transient first-run draft ids.
pub const DRAFT_ID_PREFIX: &str = "draft";

/// Content format of a note, fixed at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Raw text, edited on the plain surface
    #[default]
    Plain,
    /// Serialized styled-run document, edited on the rich surface
    Rich,
}

/// Represents a single note in our system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Raw text for plain notes, a serialized styled document for rich notes
    pub content: String,
    /// Content format, immutable after creation
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    /// Last modification time
    #[serde(rename = "lastModified", default = "Utc::now", with = "ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
}

impl Note {
    /// Creates an empty note with the given id, title, and kind.
    ///
    /// An empty or whitespace-only title falls back to "Untitled".
    pub fn new(id: String, title: String, kind: NoteKind) -> Self {
        let title = if title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            title
        };

        Note {
            id,
            title,
            content: String::new(),
            kind,
            last_modified: Utc::now(),
        }
    }

    /// True when the content is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Bumps the modification time; never moves it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.last_modified {
            self.last_modified = now;
        }
    }
}

/// Generates an id unique within `notes` using the given prefix.
///
/// Ids follow the `<prefix>-<millis>` convention; a numeric suffix is
/// appended when two notes are created within the same millisecond.
pub fn unique_note_id(prefix: &str, notes: &[Note]) -> String {
    let base = format!("{}-{}", prefix, Utc::now().timestamp_millis());
    if notes.iter().all(|n| n.id != base) {
        return base;
    }

    let mut suffix = 1;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if notes.iter().all(|n| n.id != candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_falls_back_to_untitled() {
        let note = Note::new("note-1".to_string(), "   ".to_string(), NoteKind::Plain);
        assert_eq!(note.title, "Untitled");
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut note = Note::new("note-1".to_string(), "T".to_string(), NoteKind::Plain);
        note.last_modified = Utc::now() + chrono::Duration::seconds(60);
        let before = note.last_modified;
        note.touch();
        assert_eq!(note.last_modified, before);
    }

    #[test]
    fn generated_ids_stay_unique_within_a_burst() {
        let mut notes = Vec::new();
        for _ in 0..32 {
            let id = unique_note_id(NOTE_ID_PREFIX, &notes);
            assert!(notes.iter().all(|n: &Note| n.id != id));
            notes.push(Note::new(id, "T".to_string(), NoteKind::Plain));
        }
    }

    #[test]
    fn wire_format_uses_original_field_names() {
        let note = Note::new("note-9".to_string(), "T".to_string(), NoteKind::Rich);
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["type"], "rich");
        assert!(value["lastModified"].is_i64());
    }

    #[test]
    fn missing_kind_and_timestamp_default_on_deserialize() {
        let note: Note =
            serde_json::from_str(r#"{"id":"a","title":"T","content":"c"}"#).unwrap();
        assert_eq!(note.kind, NoteKind::Plain);
    }
}
