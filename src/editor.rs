//! Editor bridge between stored note content and the two editing surfaces.
//!
//! The bridge mirrors what the panel shows: a plain text buffer and a rich
//! document model, exactly one of which is presented at a time. Extraction
//! and rendering are total over possibly-malformed stored content so a
//! corrupted note stays viewable and exportable.
use log::{debug, warn};

use crate::{escape_html, Note, NoteKind, RichDocument};

/// Which editing surface is currently bound to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Plain,
    Rich,
}

/// Output format for note export rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Raw text with styling discarded
    PlainText,
    /// Self-contained HTML document with inline styles
    StyledMarkup,
}

/// Mediates between the repository's stored content and the live surfaces.
pub struct EditorBridge {
    surface: Surface,
    plain_buffer: String,
    rich_document: RichDocument,
}

impl Default for EditorBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorBridge {
    pub fn new() -> Self {
        Self {
            surface: Surface::Plain,
            plain_buffer: String::new(),
            rich_document: RichDocument::default(),
        }
    }

    /// Routes `note` to the surface matching its kind.
    ///
    /// Loading is silent: it never counts as a user edit. Malformed rich
    /// content presents as an empty document instead of failing.
    pub fn present(&mut self, note: &Note) {
        match note.kind {
            NoteKind::Rich => {
                self.rich_document = match RichDocument::parse(&note.content) {
                    Ok(document) => document,
                    Err(e) => {
                        warn!(
                            "Note {} has malformed rich content, presenting empty document: {}",
                            note.id, e
                        );
                        RichDocument::default()
                    }
                };
                self.surface = Surface::Rich;
            }
            NoteKind::Plain => {
                self.plain_buffer = note.content.clone();
                self.surface = Surface::Plain;
            }
        }

        debug!("Presented note {} on the {:?} surface", note.id, self.surface);
    }

    /// Currently presented surface.
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Replaces the plain surface's buffer (a user edit from the UI layer).
    pub fn set_plain_text(&mut self, text: impl Into<String>) {
        self.plain_buffer = text.into();
    }

    /// Current plain surface buffer.
    pub fn plain_text(&self) -> &str {
        &self.plain_buffer
    }

    /// Replaces the rich surface's document model (a user edit from the UI layer).
    pub fn set_rich_document(&mut self, document: RichDocument) {
        self.rich_document = document;
    }

    /// Current rich surface document model.
    pub fn rich_document(&self) -> &RichDocument {
        &self.rich_document
    }

    /// Serializes the rich surface's live document to the canonical stored
    /// form. Returns `None` when the rich surface is not the presented one,
    /// so callers have nothing to flush.
    pub fn capture_live_content(&self) -> Option<String> {
        if self.surface != Surface::Rich {
            return None;
        }

        match self.rich_document.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Failed to serialize live rich document: {}", e);
                None
            }
        }
    }

    /// Extracts the user-visible text of `note`.
    ///
    /// Rich content that fails to parse is returned verbatim rather than
    /// erroring; a corrupted note must remain viewable.
    pub fn extract_plain_text(&self, note: &Note) -> String {
        match note.kind {
            NoteKind::Plain => note.content.clone(),
            NoteKind::Rich => match RichDocument::parse(&note.content) {
                Ok(document) => document.plain_text(),
                Err(e) => {
                    warn!(
                        "Note {} has malformed rich content, extracting raw content: {}",
                        note.id, e
                    );
                    note.content.clone()
                }
            },
        }
    }

    /// Renders `note` for export in `format`.
    pub fn render_export_document(&self, note: &Note, format: ExportFormat) -> String {
        match format {
            ExportFormat::PlainText => self.extract_plain_text(note),
            ExportFormat::StyledMarkup => {
                if note.kind == NoteKind::Rich {
                    match RichDocument::parse(&note.content) {
                        Ok(document) => return styled_document(&document.to_html()),
                        Err(e) => warn!(
                            "Note {} has malformed rich content, exporting plain fallback: {}",
                            note.id, e
                        ),
                    }
                }

                let text = self.extract_plain_text(note);
                minimal_document(&escape_html(&text).replace('\n', "<br>"))
            }
        }
    }
}

/// Full HTML shell used for styled exports.
fn styled_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"Generator\" content=\"panelnotes\">\n\
         <style>\n\
         body {{ font-family: Arial, sans-serif; font-size: 14px; line-height: 1.5; margin: 20px; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         {}\n\
         </body>\n\
         </html>",
        body
    )
}

/// Minimal HTML shell used when styled rendering is not possible.
fn minimal_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RichOp, StyleAttributes};
    use chrono::Utc;

    fn rich_note(content: &str) -> Note {
        Note {
            id: "note-1".to_string(),
            title: "T".to_string(),
            content: content.to_string(),
            kind: NoteKind::Rich,
            last_modified: Utc::now(),
        }
    }

    fn plain_note(content: &str) -> Note {
        Note {
            id: "note-2".to_string(),
            title: "T".to_string(),
            content: content.to_string(),
            kind: NoteKind::Plain,
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn present_routes_by_kind() {
        let mut bridge = EditorBridge::new();

        bridge.present(&plain_note("hello"));
        assert_eq!(bridge.surface(), Surface::Plain);
        assert_eq!(bridge.plain_text(), "hello");

        bridge.present(&rich_note(r#"{"ops":[{"insert":"hi"}]}"#));
        assert_eq!(bridge.surface(), Surface::Rich);
        assert_eq!(bridge.rich_document().plain_text(), "hi");
    }

    #[test]
    fn malformed_rich_content_presents_empty_document() {
        let mut bridge = EditorBridge::new();
        bridge.present(&rich_note("{not json"));
        assert_eq!(bridge.surface(), Surface::Rich);
        assert!(bridge.rich_document().ops.is_empty());
    }

    #[test]
    fn capture_returns_none_on_plain_surface() {
        let mut bridge = EditorBridge::new();
        bridge.present(&plain_note("hello"));
        bridge.set_plain_text("typed over");
        assert_eq!(bridge.plain_text(), "typed over");
        assert!(bridge.capture_live_content().is_none());
    }

    #[test]
    fn capture_serializes_the_live_document() {
        let mut bridge = EditorBridge::new();
        bridge.present(&rich_note(""));
        bridge.set_rich_document(RichDocument {
            ops: vec![RichOp::text("live")],
        });

        let captured = bridge.capture_live_content().unwrap();
        let parsed = RichDocument::parse(&captured).unwrap();
        assert_eq!(parsed.plain_text(), "live");
    }

    #[test]
    fn extraction_falls_back_to_raw_content() {
        let bridge = EditorBridge::new();
        let note = rich_note("{not json");
        assert_eq!(bridge.extract_plain_text(&note), "{not json");
    }

    #[test]
    fn styled_markup_renders_runs_and_recovers_text() {
        let bridge = EditorBridge::new();
        let document = RichDocument {
            ops: vec![
                RichOp::styled(
                    "Hello ",
                    StyleAttributes {
                        bold: Some(true),
                        ..Default::default()
                    },
                ),
                RichOp::styled(
                    "World",
                    StyleAttributes {
                        italic: Some(true),
                        ..Default::default()
                    },
                ),
                RichOp::text("\n"),
            ],
        };
        let note = rich_note(&document.to_json().unwrap());

        let html = bridge.render_export_document(&note, ExportFormat::StyledMarkup);
        assert!(html.contains(r#"<span style="font-weight: bold">Hello </span>"#));
        assert!(html.contains(r#"<span style="font-style: italic">World</span>"#));
        assert!(html.contains("<br>"));

        assert_eq!(bridge.extract_plain_text(&note), "Hello World\n");
        assert_eq!(
            bridge.render_export_document(&note, ExportFormat::PlainText),
            "Hello World\n"
        );
    }

    #[test]
    fn plain_notes_export_as_minimal_document() {
        let bridge = EditorBridge::new();
        let note = plain_note("a < b\nsecond");
        let html = bridge.render_export_document(&note, ExportFormat::StyledMarkup);
        assert!(html.contains("a &lt; b<br>second"));
        assert!(html.starts_with("<!DOCTYPE html><html>"));
    }
}
