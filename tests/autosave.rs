//! Integration tests for the debounced autosave runtime.
use std::sync::Arc;
use std::time::Duration;

use panelnotes::{AutosaveRuntime, KeyValueStore, MemoryStore, Note, NoteRepository, NOTES_KEY};
use tokio::sync::Mutex;
use tokio::time::sleep;

async fn shared_repository() -> (Arc<Mutex<NoteRepository>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let mut repository = NoteRepository::new(store.clone());
    repository.initialize().await.unwrap();
    (Arc::new(Mutex::new(repository)), store)
}

async fn persisted_notes(store: &MemoryStore) -> Vec<Note> {
    match store.get(NOTES_KEY).await.unwrap() {
        Some(value) => serde_json::from_value(value).unwrap(),
        None => Vec::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn bursts_coalesce_into_a_single_write() {
    let (repository, store) = shared_repository().await;

    let mut runtime = AutosaveRuntime::new(500);
    runtime.set_repository(&repository);
    runtime.start().unwrap();

    runtime.content_changed("a".to_string()).await.unwrap();
    runtime.content_changed("ab".to_string()).await.unwrap();
    runtime.content_changed("abc".to_string()).await.unwrap();

    sleep(Duration::from_millis(600)).await;

    let notes = persisted_notes(&store).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, "abc");
    assert_eq!(store.write_count(NOTES_KEY), 1);

    runtime.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn nothing_is_written_before_the_delay_elapses() {
    let (repository, store) = shared_repository().await;

    let mut runtime = AutosaveRuntime::new(500);
    runtime.set_repository(&repository);
    runtime.start().unwrap();

    runtime.content_changed("early".to_string()).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(store.write_count(NOTES_KEY), 0);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(store.write_count(NOTES_KEY), 1);

    runtime.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn flush_bypasses_the_remaining_delay() {
    let (repository, store) = shared_repository().await;

    let mut runtime = AutosaveRuntime::new(500);
    runtime.set_repository(&repository);
    runtime.start().unwrap();

    runtime.content_changed("urgent".to_string()).await.unwrap();
    runtime.flush().await.unwrap();
    sleep(Duration::from_millis(10)).await;

    let notes = persisted_notes(&store).await;
    assert_eq!(notes[0].content, "urgent");

    runtime.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_flushes_pending_content() {
    let (repository, store) = shared_repository().await;

    let mut runtime = AutosaveRuntime::new(500);
    runtime.set_repository(&repository);
    runtime.start().unwrap();

    runtime.content_changed("last words".to_string()).await.unwrap();
    runtime.stop().await.unwrap();

    let notes = persisted_notes(&store).await;
    assert_eq!(notes[0].content, "last words");
}

#[tokio::test(start_paused = true)]
async fn input_with_no_active_note_creates_one_immediately() {
    let (repository, store) = shared_repository().await;
    repository
        .lock()
        .await
        .finalize_first_run_draft()
        .await
        .unwrap();
    assert!(repository.lock().await.active_note_id().is_none());

    let mut runtime = AutosaveRuntime::new(500);
    runtime.set_repository(&repository);
    runtime.start().unwrap();

    runtime.content_changed("hello".to_string()).await.unwrap();
    sleep(Duration::from_millis(10)).await;

    // No debounce for the creation path.
    let notes = persisted_notes(&store).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, "hello");
    assert!(repository.lock().await.active_note_id().is_some());

    runtime.stop().await.unwrap();
}
