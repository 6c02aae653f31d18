//! In-memory `NoteStore` used by the test suites.

use super::{NoteStore, StoreError, StoreResult};
use crate::models::{sort_most_recent_first, Note, NotePatch};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::oneshot;

#[derive(Default)]
struct MemoryInner {
    notes: Vec<Note>,
    clock: u64,
    next_id: u64,
    update_calls: Vec<(String, NotePatch)>,
    delete_calls: Vec<String>,
    fail_next_update: Option<StoreError>,
    fail_next_delete: Option<StoreError>,
    update_gate: Option<oneshot::Receiver<()>>,
}

impl MemoryInner {
    fn tick(&mut self) -> String {
        self.clock += 1;
        format!("2024-01-01T00:00:00.{:06}Z", self.clock)
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub(crate) fn with_notes(notes: Vec<Note>) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().notes = notes;
        store
    }

    pub(crate) fn update_calls(&self) -> Vec<(String, NotePatch)> {
        self.inner.borrow().update_calls.clone()
    }

    pub(crate) fn delete_calls(&self) -> Vec<String> {
        self.inner.borrow().delete_calls.clone()
    }

    pub(crate) fn get(&self, id: &str) -> Option<Note> {
        self.inner.borrow().notes.iter().find(|n| n.id == id).cloned()
    }

    pub(crate) fn fail_next_update(&self, e: StoreError) {
        self.inner.borrow_mut().fail_next_update = Some(e);
    }

    pub(crate) fn fail_next_delete(&self, e: StoreError) {
        self.inner.borrow_mut().fail_next_delete = Some(e);
    }

    /// Park the next update until the returned sender fires (or is dropped).
    pub(crate) fn hold_next_update(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.borrow_mut().update_gate = Some(rx);
        tx
    }
}

impl NoteStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Note>> {
        let mut notes = self.inner.borrow().notes.clone();
        sort_most_recent_first(&mut notes);
        Ok(notes)
    }

    async fn create(&self, title: &str, content: &str, owner_id: &str) -> StoreResult<Note> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let now = inner.tick();
        let note = Note {
            id: format!("mem-{}", inner.next_id),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now.clone(),
            updated_at: now,
            owner_id: owner_id.to_string(),
        };
        inner.notes.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: &str, patch: NotePatch) -> StoreResult<Note> {
        let gate = {
            let mut inner = self.inner.borrow_mut();
            inner.update_calls.push((id.to_string(), patch.clone()));
            inner.update_gate.take()
        };
        if let Some(rx) = gate {
            let _ = rx.await;
        }

        let mut inner = self.inner.borrow_mut();
        if let Some(e) = inner.fail_next_update.take() {
            return Err(e);
        }
        let now = inner.tick();
        let note = inner
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        note.updated_at = now;
        Ok(note.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.delete_calls.push(id.to_string());
        if let Some(e) = inner.fail_next_delete.take() {
            return Err(e);
        }
        let before = inner.notes.len();
        inner.notes.retain(|n| n.id != id);
        if inner.notes.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_unknown_note_is_not_found() {
        let store = MemoryStore::default();
        let err = store
            .update("missing", NotePatch::default())
            .await
            .expect_err("update should fail");
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn test_list_orders_most_recent_first() {
        let store = MemoryStore::default();
        let a = store.create("a", "", "u1").await.expect("create a");
        let b = store.create("b", "", "u1").await.expect("create b");
        store
            .update(&a.id, NotePatch { title: Some("a2".into()), content: None })
            .await
            .expect("update a");

        let ids: Vec<String> = store.list().await.expect("list").into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let store = MemoryStore::default();
        let n = store.create("x", "", "u1").await.expect("create");
        store.delete(&n.id).await.expect("first delete");
        assert_eq!(store.delete(&n.id).await, Err(StoreError::NotFound));
    }
}
