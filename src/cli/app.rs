//! CLI module for the panelnotes application
//!
//! This is the stand-in for the panel's UI chrome: it owns all presentation
//! and drives the note repository through its collaborator-facing entry
//! points.
use std::{
    fs,
    io::{stdin, stdout, Write},
    path::PathBuf,
    sync::Arc,
};

use chrono::{Local, Utc};
use console::style;
use log::info;
use tokio::sync::Mutex;

use crate::{
    AutosaveRuntime, Commands, Config, ExportFormat, MutationOutcome, NoteKind, NoteRepository,
    PanelError, Result,
};

/// CLI application handler - processes commands and interfaces with the
/// note repository.
pub struct App {
    /// The note repository backend
    repository: Arc<Mutex<NoteRepository>>,

    /// Debounced write path for live input
    autosave: AutosaveRuntime,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application over the given repository and config
    pub fn new(
        repository: Arc<Mutex<NoteRepository>>,
        autosave: AutosaveRuntime,
        config: Config,
        verbose: bool,
    ) -> Self {
        Self {
            repository,
            autosave,
            config,
            verbose,
        }
    }

    /// Session teardown: flush and stop the autosave task, then discard an
    /// untouched first-run draft so it never survives as a ghost note.
    pub async fn shutdown(mut self) -> Result<()> {
        self.autosave.stop().await?;
        self.repository.lock().await.finalize_first_run_draft().await
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::New { rich, title } => self.handle_new(rich, title).await?,

            Commands::List { json } => self.handle_list(json).await?,

            Commands::Open { id } => self.handle_open(id).await?,

            Commands::Rename { id, title } => self.handle_rename(id, title).await?,

            Commands::Delete { id, force } => self.handle_delete(id, force).await?,

            Commands::Write { content, file, id } => self.handle_write(content, file, id).await?,

            Commands::Show { id, html } => self.handle_show(id, html).await?,

            Commands::Export { output } => self.handle_export(output).await?,

            Commands::Import { input } => self.handle_import(input).await?,
        }

        Ok(())
    }

    async fn handle_new(&self, rich: bool, title: Option<String>) -> Result<()> {
        let kind = if rich { NoteKind::Rich } else { NoteKind::Plain };

        let mut repository = self.repository.lock().await;
        let id = repository.create_note(kind).await?;
        if let Some(title) = title {
            repository.rename(&id, &title).await?;
        }

        println!("Note created with ID: {}", id);
        Ok(())
    }

    async fn handle_list(&self, json: bool) -> Result<()> {
        let repository = self.repository.lock().await;
        let notes = repository.notes();

        if json {
            println!("{}", serde_json::to_string_pretty(notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No saved notes");
            return Ok(());
        }

        for note in notes {
            let active = repository.active_note_id() == Some(note.id.as_str());
            let marker = if active { "*" } else { " " };
            let kind = match note.kind {
                NoteKind::Rich => "rich",
                NoteKind::Plain => "plain",
            };
            let date = note
                .last_modified
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M");

            println!(
                "{} {}  {}  [{}]  {}",
                marker,
                style(&note.id).dim(),
                style(&note.title).bold(),
                kind,
                date
            );

            if self.verbose {
                let preview = repository.bridge().extract_plain_text(note);
                let preview = preview.lines().next().unwrap_or_default();
                println!("      {}", style(preview).dim());
            }
        }

        Ok(())
    }

    async fn handle_open(&self, id: String) -> Result<()> {
        let outcome = self.repository.lock().await.switch_active(&id).await?;
        match outcome {
            MutationOutcome::Applied => println!("Active note: {}", id),
            MutationOutcome::Ignored => println!("Note {} is already active", id),
            MutationOutcome::UnknownId => println!("No note with id {}", id),
        }
        Ok(())
    }

    async fn handle_rename(&self, id: String, title: String) -> Result<()> {
        let outcome = self.repository.lock().await.rename(&id, &title).await?;
        match outcome {
            MutationOutcome::Applied => println!("Renamed note {}", id),
            MutationOutcome::Ignored => println!("Empty title ignored"),
            MutationOutcome::UnknownId => println!("No note with id {}", id),
        }
        Ok(())
    }

    async fn handle_delete(&self, id: String, force: bool) -> Result<()> {
        if self.config.confirm_delete && !force {
            print!("Delete note {}? [y/N] ", id);
            stdout().flush()?;

            let mut answer = String::new();
            stdin().read_line(&mut answer)?;
            if !matches!(answer.trim(), "y" | "Y" | "yes") {
                println!("Aborted");
                return Ok(());
            }
        }

        let outcome = self.repository.lock().await.delete(&id).await?;
        match outcome {
            MutationOutcome::Applied => println!("Deleted note {}", id),
            MutationOutcome::UnknownId => println!("No note with id {}", id),
            MutationOutcome::Ignored => {}
        }
        Ok(())
    }

    async fn handle_write(
        &self,
        content: Option<String>,
        file: Option<PathBuf>,
        id: Option<String>,
    ) -> Result<()> {
        let new_content = match (content, file) {
            (Some(c), _) => c,
            (_, Some(path)) => {
                if !path.exists() {
                    return Err(PanelError::ApplicationError {
                        message: format!("File not found: {}", path.display()),
                    });
                }
                fs::read_to_string(path)?
            }
            (None, None) => {
                return Err(PanelError::ApplicationError {
                    message: "Provide content as an argument or with --file".to_string(),
                });
            }
        };

        match id {
            Some(id) => {
                let outcome = self
                    .repository
                    .lock()
                    .await
                    .update_content(&id, &new_content)
                    .await?;
                match outcome {
                    MutationOutcome::Applied => println!("Updated note {}", id),
                    _ => println!("No note with id {}", id),
                }
            }
            None => {
                // The live-typing path: the event goes through the debounce
                // runtime; the flush lands before shutdown joins the task.
                self.autosave.content_changed(new_content).await?;
                self.autosave.flush().await?;
                println!("Saved content to the active note");
            }
        }
        Ok(())
    }

    async fn handle_show(&self, id: Option<String>, html: bool) -> Result<()> {
        let repository = self.repository.lock().await;
        let id = match id.or_else(|| repository.active_note_id().map(str::to_string)) {
            Some(id) => id,
            None => {
                println!("No active note");
                return Ok(());
            }
        };

        let Some(note) = repository.find_note(&id) else {
            println!("No note with id {}", id);
            return Ok(());
        };

        let format = if html {
            ExportFormat::StyledMarkup
        } else {
            ExportFormat::PlainText
        };
        println!("{}", repository.bridge().render_export_document(note, format));
        Ok(())
    }

    async fn handle_export(&self, output: Option<PathBuf>) -> Result<()> {
        let payload = self.repository.lock().await.export_all();

        let default_name = format!("notepad-backup-{}.json", Utc::now().format("%Y-%m-%d"));
        let path = match output {
            Some(path) if path.is_dir() => path.join(default_name),
            Some(path) => path,
            None => PathBuf::from(default_name),
        };

        let json = serde_json::to_string_pretty(&payload)?;
        fs::write(&path, json)?;

        info!("Exported {} notes to {}", payload.notes.len(), path.display());
        println!("Exported {} note(s) to {}", payload.notes.len(), path.display());
        Ok(())
    }

    async fn handle_import(&self, input: PathBuf) -> Result<()> {
        let raw = fs::read_to_string(&input)?;
        let payload = serde_json::from_str(&raw).map_err(|e| PanelError::InvalidImport {
            reason: format!("not valid JSON: {}", e),
        })?;

        let summary = self.repository.lock().await.import_all(&payload).await?;

        if summary.entries_dropped > 0 {
            println!(
                "Skipped {} malformed entr{}",
                summary.entries_dropped,
                if summary.entries_dropped == 1 { "y" } else { "ies" }
            );
        }
        println!("Successfully imported {} note(s)", summary.notes_imported);
        Ok(())
    }
}
