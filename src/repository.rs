//! Note repository: the in-memory note collection, the active-note pointer,
//! and every mutation that keeps both consistent with the backing store.
//!
//! The in-memory collection is the single source of truth during a session;
//! the store is a full snapshot written on mutation and read back only at
//! `initialize()`.
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    unique_note_id, validate_import, EditorBridge, ExportPayload, ImportSummary, KeyValueStore,
    MutationOutcome, Note, NoteKind, PanelError, Result, ACTIVE_NOTE_KEY, DRAFT_ID_PREFIX,
    NOTES_KEY, NOTE_ID_PREFIX,
};

/// Version tag written into export payloads.
pub const EXPORT_VERSION: u32 = 1;

/// Owns the ordered note list and the active-note pointer.
///
/// Invariants upheld across every operation: ids are unique, at most one
/// note is active, and the active id always resolves to a note in the
/// collection (or is unset).
pub struct NoteRepository {
    /// Backing key/value store
    store: Arc<dyn KeyValueStore>,

    /// Bridge to the editing surfaces
    bridge: EditorBridge,

    /// In-memory note collection in display order (newest first)
    notes: Vec<Note>,

    /// Id of the note bound to the visible surface
    active_note_id: Option<String>,

    /// Whether the active note is an auto-created, still-untouched draft
    first_run_draft: bool,

    /// Flag indicating the repository has loaded its persisted state
    initialized: bool,
}

impl NoteRepository {
    /// Creates a repository over the given store. Call [`initialize`]
    /// before using it.
    ///
    /// [`initialize`]: NoteRepository::initialize
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            bridge: EditorBridge::new(),
            notes: Vec::new(),
            active_note_id: None,
            first_run_draft: false,
            initialized: false,
        }
    }

    /// Loads the persisted collection and resolves the active note.
    ///
    /// The stored active id wins when it still resolves; otherwise the most
    /// recently modified note becomes active; otherwise a fresh first-run
    /// draft is created. The resulting pointer is persisted either way.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        info!("Initializing note repository");

        self.notes = match self.store.get(NOTES_KEY).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        info!("Loaded {} notes from the store", self.notes.len());

        let stored_active = match self.store.get(ACTIVE_NOTE_KEY).await? {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };

        self.initialized = true;

        if let Some(id) = stored_active {
            if self.find_note(&id).is_some() {
                return self.enter_note(&id).await;
            }
            debug!("Stored active note id {} no longer resolves", id);
        }

        self.activate_fallback().await
    }

    /// Every note in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Id of the currently active note, if any.
    pub fn active_note_id(&self) -> Option<&str> {
        self.active_note_id.as_deref()
    }

    /// Whether the active note is a still-untouched first-run draft.
    pub fn is_first_run_draft(&self) -> bool {
        self.first_run_draft
    }

    /// Looks up a note by id.
    pub fn find_note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    fn find_note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == note_id)
    }

    /// Read access to the editing surfaces.
    pub fn bridge(&self) -> &EditorBridge {
        &self.bridge
    }

    /// Mutable access to the editing surfaces, used by the UI layer to push
    /// live edits into the presented surface.
    pub fn bridge_mut(&mut self) -> &mut EditorBridge {
        &mut self.bridge
    }

    /// Inserts a new note at the front of the collection and switches to it.
    ///
    /// Returns the new note's id.
    pub async fn create_note(&mut self, kind: NoteKind) -> Result<String> {
        let id = unique_note_id(NOTE_ID_PREFIX, &self.notes);
        let title = format!("New note {}", self.notes.len() + 1);
        let note = Note::new(id.clone(), title, kind);

        info!("Creating {:?} note {}", kind, id);
        self.notes.insert(0, note);
        self.persist_notes().await?;
        self.enter_note(&id).await?;

        Ok(id)
    }

    /// Makes `note_id` the active note.
    ///
    /// Live rich content of the previously active note is flushed and
    /// persisted before the pointer moves.
    pub async fn switch_active(&mut self, note_id: &str) -> Result<MutationOutcome> {
        if self.active_note_id.as_deref() == Some(note_id) {
            debug!("Note {} is already active", note_id);
            return Ok(MutationOutcome::Ignored);
        }

        if self.find_note(note_id).is_none() {
            debug!("Cannot switch to unknown note {}", note_id);
            return Ok(MutationOutcome::UnknownId);
        }

        self.enter_note(note_id).await?;
        Ok(MutationOutcome::Applied)
    }

    /// Sets a new title. Empty titles are ignored.
    pub async fn rename(&mut self, note_id: &str, new_title: &str) -> Result<MutationOutcome> {
        let trimmed = new_title.trim();
        if trimmed.is_empty() {
            debug!("Ignoring empty rename for note {}", note_id);
            return Ok(MutationOutcome::Ignored);
        }

        let Some(note) = self.find_note_mut(note_id) else {
            debug!("Cannot rename unknown note {}", note_id);
            return Ok(MutationOutcome::UnknownId);
        };
        note.title = trimmed.to_string();
        note.touch();

        info!("Renamed note {} to {:?}", note_id, trimmed);
        self.persist_notes().await?;
        Ok(MutationOutcome::Applied)
    }

    /// Removes a note. Deleting the active note picks a successor: the most
    /// recently modified remaining note, or a fresh draft when none remain.
    pub async fn delete(&mut self, note_id: &str) -> Result<MutationOutcome> {
        if self.find_note(note_id).is_none() {
            debug!("Cannot delete unknown note {}", note_id);
            return Ok(MutationOutcome::UnknownId);
        }

        self.notes.retain(|n| n.id != note_id);
        info!("Deleted note {}", note_id);
        self.persist_notes().await?;

        if self.active_note_id.as_deref() == Some(note_id) {
            self.active_note_id = None;
            self.persist_active_id().await?;
            self.activate_fallback().await?;
        }

        Ok(MutationOutcome::Applied)
    }

    /// Writes new content to a note and persists the collection.
    ///
    /// This is the autosave write path; calling it twice with identical
    /// content leaves the same persisted state apart from `lastModified`.
    pub async fn update_content(
        &mut self,
        note_id: &str,
        content: &str,
    ) -> Result<MutationOutcome> {
        let Some(note) = self.find_note_mut(note_id) else {
            debug!("Cannot update unknown note {}", note_id);
            return Ok(MutationOutcome::UnknownId);
        };
        note.content = content.to_string();
        note.touch();

        self.persist_notes().await?;
        Ok(MutationOutcome::Applied)
    }

    /// Entry point for live content-change events from the UI layer.
    ///
    /// With an active note this is an immediate [`update_content`]. With no
    /// active note the content seeds a brand-new plain note, mirroring a
    /// first keystroke into an empty panel. Returns the id that received
    /// the content.
    ///
    /// [`update_content`]: NoteRepository::update_content
    pub async fn content_changed(&mut self, content: &str) -> Result<String> {
        if let Some(active_id) = self.active_note_id.clone() {
            self.update_content(&active_id, content).await?;
            return Ok(active_id);
        }

        let id = unique_note_id(NOTE_ID_PREFIX, &self.notes);
        let title = format!("New note {}", self.notes.len() + 1);
        let mut note = Note::new(id.clone(), title, NoteKind::Plain);
        note.content = content.to_string();

        info!("No active note; created note {} from live input", id);
        self.notes.insert(0, note);
        self.active_note_id = Some(id.clone());
        self.first_run_draft = false;
        self.persist_notes().await?;
        self.persist_active_id().await?;

        Ok(id)
    }

    /// Shutdown hook: discards the first-run draft when it never received
    /// content, so an untouched first visit leaves no ghost note behind.
    pub async fn finalize_first_run_draft(&mut self) -> Result<()> {
        if !self.first_run_draft {
            return Ok(());
        }
        let Some(active_id) = self.active_note_id.clone() else {
            return Ok(());
        };
        let blank = self.find_note(&active_id).is_some_and(Note::is_blank);
        if !blank {
            return Ok(());
        }

        info!("Discarding empty first-run draft {}", active_id);
        self.notes.retain(|n| n.id != active_id);
        self.active_note_id = None;
        self.first_run_draft = false;
        self.persist_notes().await
    }

    /// Serializes the full collection plus the active pointer for backup.
    pub fn export_all(&self) -> ExportPayload {
        ExportPayload {
            notes: self.notes.clone(),
            active_note_id: self.active_note_id.clone(),
            exported_at: Utc::now(),
            version: EXPORT_VERSION,
        }
    }

    /// Replaces the collection wholesale from an export payload.
    ///
    /// The payload's active id wins when it resolves after filtering,
    /// falling back to the first imported note, then to a fresh draft.
    pub async fn import_all(&mut self, payload: &Value) -> Result<ImportSummary> {
        let validated = validate_import(payload)?;
        for violation in &validated.violations {
            warn!(
                "Dropping import entry {} with missing or malformed {}",
                violation.index, violation.field
            );
        }

        info!(
            "Importing {} notes ({} entries dropped)",
            validated.notes.len(),
            validated.violations.len()
        );

        self.notes = validated.notes;
        self.active_note_id = None;
        self.first_run_draft = false;
        let notes_imported = self.notes.len();
        self.persist_notes().await?;

        let target = validated
            .active_note_id
            .filter(|id| self.find_note(id).is_some())
            .or_else(|| self.notes.first().map(|n| n.id.clone()));

        match target {
            Some(id) => self.enter_note(&id).await?,
            None => self.create_draft().await?,
        }

        Ok(ImportSummary {
            notes_imported,
            entries_dropped: validated.violations.len(),
            active_note_id: self.active_note_id.clone(),
        })
    }

    /// Binds `id` as the active note: flush the previous surface, move the
    /// pointer, persist it, and present the new note.
    async fn enter_note(&mut self, id: &str) -> Result<()> {
        self.flush_live_rich_content().await?;

        let note = match self.find_note(id) {
            Some(note) => note.clone(),
            None => {
                return Err(PanelError::NoteNotFound { id: id.to_string() });
            }
        };

        self.active_note_id = Some(note.id.clone());
        self.first_run_draft = false;
        self.persist_active_id().await?;
        self.bridge.present(&note);

        debug!("Note {} is now active", note.id);
        Ok(())
    }

    /// Flushes the live rich surface into the active note and persists.
    ///
    /// Runs synchronously on every switch, bypassing the autosave debounce,
    /// so the last edit survives the switch.
    async fn flush_live_rich_content(&mut self) -> Result<()> {
        let Some(active_id) = self.active_note_id.clone() else {
            return Ok(());
        };
        let Some(note) = self.find_note(&active_id) else {
            return Ok(());
        };
        if note.kind != NoteKind::Rich {
            return Ok(());
        }

        if let Some(content) = self.bridge.capture_live_content() {
            if let Some(note) = self.find_note_mut(&active_id) {
                if note.content != content {
                    debug!("Flushing live rich content of note {}", active_id);
                    note.content = content;
                    note.touch();
                }
            }
            self.persist_notes().await?;
        }

        Ok(())
    }

    /// Picks the most recently modified note, or creates a fresh draft.
    async fn activate_fallback(&mut self) -> Result<()> {
        match self.most_recent_note_id() {
            Some(id) => self.enter_note(&id).await,
            None => self.create_draft().await,
        }
    }

    /// Most recent by `lastModified`; ties keep the first note in stored order.
    fn most_recent_note_id(&self) -> Option<String> {
        let mut best: Option<&Note> = None;
        for note in &self.notes {
            match best {
                Some(current) if note.last_modified <= current.last_modified => {}
                _ => best = Some(note),
            }
        }
        best.map(|n| n.id.clone())
    }

    /// Creates an empty plain draft, activates it, and marks it as the
    /// first-run draft. Only the active pointer is persisted; the draft
    /// itself joins the stored collection once it receives content.
    async fn create_draft(&mut self) -> Result<()> {
        let id = unique_note_id(DRAFT_ID_PREFIX, &self.notes);
        let draft = Note::new(id.clone(), String::new(), NoteKind::Plain);

        info!("Creating first-run draft note {}", id);
        self.bridge.present(&draft);
        self.notes.push(draft);
        self.active_note_id = Some(id);
        self.first_run_draft = true;
        self.persist_active_id().await
    }

    async fn persist_notes(&self) -> Result<()> {
        let value = serde_json::to_value(&self.notes)?;
        self.store.set(NOTES_KEY, value).await
    }

    async fn persist_active_id(&self) -> Result<()> {
        let value = match &self.active_note_id {
            Some(id) => Value::String(id.clone()),
            None => Value::Null,
        };
        self.store.set(ACTIVE_NOTE_KEY, value).await
    }
}
