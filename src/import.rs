//! Shape validation for imported backup payloads.
//!
//! Top-level defects (not an object, missing or non-array `notes`) fail the
//! whole import with a user-visible reason; entry-level defects only drop
//! the offending entry and are reported as violations.
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::{Note, NoteKind, PanelError, Result};

/// A single entry-level defect found while validating an import payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportViolation {
    /// Index of the entry in the payload's `notes` array
    pub index: usize,
    /// Field that was missing or malformed
    pub field: &'static str,
}

/// Result of validating an import payload's shape.
pub struct ValidatedImport {
    /// Entries that passed validation, in payload order
    pub notes: Vec<Note>,
    /// The payload's active note pointer, if it carried one
    pub active_note_id: Option<String>,
    /// Entries that were dropped, and why
    pub violations: Vec<ImportViolation>,
}

/// Validates the top-level shape of `payload` and filters malformed entries.
pub fn validate_import(payload: &Value) -> Result<ValidatedImport> {
    let Some(object) = payload.as_object() else {
        return Err(PanelError::InvalidImport {
            reason: "payload is not a JSON object".to_string(),
        });
    };

    let Some(notes_value) = object.get("notes") else {
        return Err(PanelError::InvalidImport {
            reason: "payload has no notes field".to_string(),
        });
    };

    let Some(entries) = notes_value.as_array() else {
        return Err(PanelError::InvalidImport {
            reason: "notes is not an array".to_string(),
        });
    };

    let mut notes = Vec::with_capacity(entries.len());
    let mut violations = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry) {
            Ok(note) => notes.push(note),
            Err(field) => violations.push(ImportViolation { index, field }),
        }
    }

    let active_note_id = object
        .get("activeNoteId")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ValidatedImport {
        notes,
        active_note_id,
        violations,
    })
}

/// An entry must carry a non-empty `id` and string `title` and `content`;
/// `type` defaults to plain and `lastModified` to now.
fn validate_entry(entry: &Value) -> std::result::Result<Note, &'static str> {
    let Some(object) = entry.as_object() else {
        return Err("entry");
    };

    let id = object.get("id").and_then(Value::as_str).unwrap_or_default();
    if id.is_empty() {
        return Err("id");
    }

    let Some(title) = object.get("title").and_then(Value::as_str) else {
        return Err("title");
    };

    let Some(content) = object.get("content").and_then(Value::as_str) else {
        return Err("content");
    };

    let kind = match object.get("type").and_then(Value::as_str) {
        Some("rich") => NoteKind::Rich,
        _ => NoteKind::Plain,
    };

    let last_modified = object
        .get("lastModified")
        .and_then(Value::as_i64)
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or_else(Utc::now);

    Ok(Note {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        kind,
        last_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_payload() {
        assert!(matches!(
            validate_import(&json!("nope")),
            Err(PanelError::InvalidImport { .. })
        ));
    }

    #[test]
    fn rejects_non_array_notes() {
        assert!(matches!(
            validate_import(&json!({"notes": "not an array"})),
            Err(PanelError::InvalidImport { .. })
        ));
    }

    #[test]
    fn drops_entries_missing_required_fields() {
        let payload = json!({
            "notes": [
                {"id": "a", "title": "T", "content": "c"},
                {"title": "no id", "content": "c"},
                {"id": "", "title": "blank id", "content": "c"},
                {"id": "b", "content": "no title"},
                {"id": "c", "title": "no content"},
            ]
        });

        let validated = validate_import(&payload).unwrap();
        assert_eq!(validated.notes.len(), 1);
        assert_eq!(validated.notes[0].id, "a");
        assert_eq!(validated.violations.len(), 4);
        assert_eq!(validated.violations[1].field, "id");
    }

    #[test]
    fn defaults_kind_and_last_modified() {
        let payload = json!({
            "notes": [{"id": "a", "title": "T", "content": "c"}],
            "activeNoteId": "a",
        });

        let validated = validate_import(&payload).unwrap();
        assert_eq!(validated.notes[0].kind, NoteKind::Plain);
        assert_eq!(validated.active_note_id.as_deref(), Some("a"));
    }

    #[test]
    fn keeps_rich_kind_and_millis_timestamp() {
        let payload = json!({
            "notes": [{
                "id": "a",
                "title": "T",
                "content": "{}",
                "type": "rich",
                "lastModified": 1700000000000_i64,
            }]
        });

        let validated = validate_import(&payload).unwrap();
        assert_eq!(validated.notes[0].kind, NoteKind::Rich);
        assert_eq!(validated.notes[0].last_modified.timestamp_millis(), 1700000000000);
    }
}
