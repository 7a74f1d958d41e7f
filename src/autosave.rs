// src/autosave.rs - Debounced autosave module
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::{NoteRepository, PanelError, Result};

/// Commands understood by the autosave task.
#[derive(Debug, Clone)]
pub enum AutosaveCommand {
    /// A live content-change event; restarts the debounce timer
    ContentChanged { content: String },
    /// Write any pending content immediately
    Flush,
    /// Flush and terminate the task
    Stop,
}

/// Debounced autosave runtime.
///
/// Content-change events restart a single timer; only the last event of a
/// burst is written, through the repository's content update path. Events
/// arriving while no note is active create one immediately instead of
/// waiting out the delay.
pub struct AutosaveRuntime {
    /// Debounce delay between the last change event and the write
    delay: Duration,

    /// Channel to send commands to the autosave task
    command_tx: mpsc::Sender<AutosaveCommand>,

    /// Handle to the autosave task
    task: Option<JoinHandle<()>>,

    /// Weak reference to the repository
    repository: Option<Weak<Mutex<NoteRepository>>>,

    /// Whether the task is currently running
    running: bool,
}

impl AutosaveRuntime {
    /// Creates a runtime with the given debounce delay.
    pub fn new(delay_ms: u64) -> Self {
        let (command_tx, _) = mpsc::channel(64);

        Self {
            delay: Duration::from_millis(delay_ms),
            command_tx,
            task: None,
            repository: None,
            running: false,
        }
    }

    /// Set the weak reference to the repository
    pub fn set_repository(&mut self, repository: &Arc<Mutex<NoteRepository>>) {
        self.repository = Some(Arc::downgrade(repository));
    }

    /// Starts the background debounce task.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }

        let repository = match &self.repository {
            Some(weak) => weak.clone(),
            None => {
                error!("No repository reference set on the autosave runtime");
                return Err(PanelError::ApplicationError {
                    message: "AutosaveRuntime does not have a repository reference".to_string(),
                });
            }
        };

        let (command_tx, command_rx) = mpsc::channel(64);
        self.command_tx = command_tx;

        let task = tokio::spawn(run_autosave_loop(repository, command_rx, self.delay));
        self.task = Some(task);
        self.running = true;

        info!("Autosave runtime started with a {:?} debounce", self.delay);
        Ok(())
    }

    /// Forwards a live content-change event to the task.
    pub async fn content_changed(&self, content: String) -> Result<()> {
        self.send(AutosaveCommand::ContentChanged { content }).await
    }

    /// Writes pending content now, bypassing the remaining delay.
    pub async fn flush(&self) -> Result<()> {
        self.send(AutosaveCommand::Flush).await
    }

    /// Flushes pending content and stops the task.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            if let Err(e) = self.command_tx.send(AutosaveCommand::Stop).await {
                error!("Failed to send stop command to autosave task: {}", e);
            }

            if let Err(e) = task.await {
                let message = format!("Failed to stop autosave task: {}", e);
                error!("{}", message);
                return Err(PanelError::ApplicationError { message });
            }

            self.running = false;
            info!("Autosave runtime stopped");
        } else {
            debug!("Autosave runtime is not running");
        }

        Ok(())
    }

    async fn send(&self, command: AutosaveCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| PanelError::ApplicationError {
                message: format!("Failed to send autosave command: {}", e),
            })
    }
}

async fn run_autosave_loop(
    repository: Weak<Mutex<NoteRepository>>,
    mut command_rx: mpsc::Receiver<AutosaveCommand>,
    delay: Duration,
) {
    let mut pending: Option<(String, String)> = None;
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(AutosaveCommand::ContentChanged { content }) => {
                    if let Some(target) = bind_target(&repository, content).await {
                        pending = Some(target);
                        deadline = Instant::now() + delay;
                    }
                }
                Some(AutosaveCommand::Flush) => {
                    write_pending(&repository, pending.take()).await;
                }
                Some(AutosaveCommand::Stop) | None => {
                    write_pending(&repository, pending.take()).await;
                    break;
                }
            },
            _ = sleep_until(deadline), if pending.is_some() => {
                write_pending(&repository, pending.take()).await;
            }
        }
    }

    debug!("Autosave task stopped");
}

/// Resolves which note a change event targets.
///
/// The id is bound at event time so a note switch during the delay cannot
/// redirect the pending write. With no active note the content seeds a new
/// note immediately and nothing is left pending.
async fn bind_target(
    repository: &Weak<Mutex<NoteRepository>>,
    content: String,
) -> Option<(String, String)> {
    let Some(repository) = repository.upgrade() else {
        warn!("Repository dropped; discarding content-change event");
        return None;
    };
    let mut repository = repository.lock().await;

    let active = repository.active_note_id().map(str::to_string);
    match active {
        Some(id) => Some((id, content)),
        None => {
            if let Err(e) = repository.content_changed(&content).await {
                error!("Failed to create note from live input: {}", e);
            }
            None
        }
    }
}

async fn write_pending(
    repository: &Weak<Mutex<NoteRepository>>,
    pending: Option<(String, String)>,
) {
    let Some((note_id, content)) = pending else {
        return;
    };
    let Some(repository) = repository.upgrade() else {
        warn!(
            "Repository dropped; discarding pending autosave for note {}",
            note_id
        );
        return;
    };

    let mut repository = repository.lock().await;
    match repository.update_content(&note_id, &content).await {
        Ok(outcome) => debug!("Autosave write for note {}: {:?}", note_id, outcome),
        Err(e) => error!("Autosave write for note {} failed: {}", note_id, e),
    }
}
