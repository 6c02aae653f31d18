use crate::autosave::AutosaveScheduler;
use crate::feedback::{Notice, Notifier};
use crate::models::{Note, NoteFields, NotePatch};
use crate::runtime::TaskRuntime;
use crate::store::{NoteStore, StoreError};
use crate::surface::{EditorWidget, RichTextSurface, SurfaceError};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Mode {
    Preview,
    Edit,
}

/// Read-only picture of the draft, handed to the UI after every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftView {
    pub note_id: Option<String>,
    pub title: String,
    pub content: String,
    pub dirty: bool,
    pub mode: Mode,
    pub saving: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Changed(DraftView),
    /// The store accepted an update. Carries the server's record.
    Saved(Note),
    Deleted(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Draft already matched the last persisted state; nothing was sent.
    Unchanged,
    NothingSelected,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("saving failed: {0}")]
    Save(StoreError),
    #[error("deleting failed: {0}")]
    Delete(StoreError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveTrigger {
    Manual,
    Autosave,
    Toggle,
}

impl SaveTrigger {
    fn announces_success(self) -> bool {
        !matches!(self, SaveTrigger::Autosave)
    }
}

/// What gets sent: the draft as it was when the save was requested.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SaveRequest {
    note_id: String,
    epoch: u64,
    fields: NoteFields,
}

#[derive(Debug)]
struct Draft {
    note_id: Option<String>,
    /// Note whose content was last pushed into the surface.
    loaded_note_id: Option<String>,
    /// Bumped on every selection change; async results from an older epoch
    /// must not touch the draft.
    epoch: u64,
    fields: NoteFields,
    last_persisted: NoteFields,
    dirty: bool,
    mode: Mode,
    saves_in_flight: u32,
}

impl Draft {
    fn empty() -> Self {
        Self {
            note_id: None,
            loaded_note_id: None,
            epoch: 0,
            fields: NoteFields::default(),
            last_persisted: NoteFields::default(),
            dirty: false,
            mode: Mode::Edit,
            saves_in_flight: 0,
        }
    }

    fn recompute_dirty(&mut self) {
        self.dirty = match self.note_id {
            Some(_) => self.fields != self.last_persisted,
            None => !self.fields.is_empty(),
        };
    }

    fn save_request(&self) -> Option<SaveRequest> {
        self.note_id.as_ref().map(|id| SaveRequest {
            note_id: id.clone(),
            epoch: self.epoch,
            fields: self.fields.clone(),
        })
    }

    fn view(&self) -> DraftView {
        DraftView {
            note_id: self.note_id.clone(),
            title: self.fields.title.clone(),
            content: self.fields.content.clone(),
            dirty: self.dirty,
            mode: self.mode,
            saving: self.saves_in_flight > 0,
        }
    }
}

enum EditEffect {
    Arm(SaveRequest),
    Disarm,
    Nothing,
}

struct Inner<S, W, R: TaskRuntime> {
    store: S,
    runtime: R,
    surface: RichTextSurface<W>,
    autosave: AutosaveScheduler<R, SaveRequest>,
    notifier: Box<dyn Notifier>,
    draft: RefCell<Draft>,
    listeners: RefCell<Vec<Rc<dyn Fn(&SessionEvent)>>>,
}

/// Reconciles the selected note, the editable draft, the rich text surface and
/// autosave timing.
///
/// Cheap to clone; every clone drives the same session. All state lives on the
/// event-loop thread and no borrow is held across an `.await` or a callback.
pub struct NoteSession<S, W, R: TaskRuntime> {
    inner: Rc<Inner<S, W, R>>,
}

impl<S, W, R: TaskRuntime> Clone for NoteSession<S, W, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, W, R> NoteSession<S, W, R>
where
    S: NoteStore,
    W: EditorWidget,
    R: TaskRuntime,
{
    pub fn new(
        store: S,
        runtime: R,
        notifier: impl Notifier + 'static,
        quiet_period: Duration,
    ) -> Self {
        let inner = Rc::new(Inner {
            store,
            runtime: runtime.clone(),
            surface: RichTextSurface::new(),
            autosave: AutosaveScheduler::new(runtime, quiet_period),
            notifier: Box::new(notifier),
            draft: RefCell::new(Draft::empty()),
            listeners: RefCell::new(vec![]),
        });

        let weak = Rc::downgrade(&inner);
        inner.surface.on_user_change(move |html| {
            if let Some(inner) = weak.upgrade() {
                NoteSession { inner }.edit_content(html);
            }
        });

        let weak = Rc::downgrade(&inner);
        inner.surface.on_ready(move || {
            if let Some(inner) = weak.upgrade() {
                NoteSession { inner }.sync_surface();
            }
        });

        Self { inner }
    }

    /// Bind the editor widget. Safe to call on every render; only the first
    /// successful call builds anything.
    pub fn mount_surface(&self, build: impl FnOnce() -> Result<W, SurfaceError>) {
        if let Err(e) = self.inner.surface.mount(build) {
            self.inner
                .notifier
                .notify(Notice::error(format!("Editor unavailable: {e}")));
        }
    }

    pub fn subscribe(&self, f: impl Fn(&SessionEvent) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(f));
    }

    pub fn view(&self) -> DraftView {
        self.inner.draft.borrow().view()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.inner.draft.borrow().note_id.clone()
    }

    pub fn last_persisted(&self) -> NoteFields {
        self.inner.draft.borrow().last_persisted.clone()
    }

    pub fn autosave_armed(&self) -> bool {
        self.inner.autosave.is_armed()
    }

    /// The selection changed (to a note, or to nothing).
    pub fn select(&self, note: Option<&Note>) {
        // Whatever was waiting for the quiet period belongs to the old note.
        if let Some(pending) = self.inner.autosave.flush() {
            self.spawn_save(pending, SaveTrigger::Autosave);
        }

        let (force_replace, content, mode) = {
            let mut d = self.inner.draft.borrow_mut();
            d.epoch += 1;
            d.dirty = false;
            match note {
                Some(note) => {
                    let same_note = d.loaded_note_id.as_deref() == Some(note.id.as_str());
                    d.note_id = Some(note.id.clone());
                    d.loaded_note_id = Some(note.id.clone());
                    d.fields = note.fields();
                    d.last_persisted = note.fields();
                    d.mode = Mode::Preview;
                    (!same_note, note.content.clone(), Mode::Preview)
                }
                None => {
                    d.note_id = None;
                    d.loaded_note_id = None;
                    d.fields = NoteFields::default();
                    d.last_persisted = NoteFields::default();
                    d.mode = Mode::Edit;
                    (false, String::new(), Mode::Edit)
                }
            }
        };

        tracing::debug!(note_id = ?self.selected_id(), %mode, "selection changed");

        let surface = &self.inner.surface;
        if force_replace || surface.content() != content {
            surface.set_content(&content);
        }
        surface.set_enabled(mode == Mode::Edit);

        self.publish_changed();
    }

    pub fn edit_title(&self, title: &str) {
        self.apply_edit(|f| {
            if f.title == title {
                return false;
            }
            f.title = title.to_string();
            true
        });
    }

    pub fn edit_content(&self, html: &str) {
        self.apply_edit(|f| {
            if f.content == html {
                return false;
            }
            f.content = html.to_string();
            true
        });
    }

    fn apply_edit(&self, edit: impl FnOnce(&mut NoteFields) -> bool) {
        let effect = {
            let mut d = self.inner.draft.borrow_mut();
            if !edit(&mut d.fields) {
                return;
            }
            d.recompute_dirty();
            match d.save_request() {
                Some(req) if d.dirty => EditEffect::Arm(req),
                Some(_) => EditEffect::Disarm,
                // Nowhere to save to until the shell creates a note.
                None => EditEffect::Nothing,
            }
        };

        match effect {
            EditEffect::Arm(req) => self.arm_autosave(req),
            EditEffect::Disarm => self.inner.autosave.cancel(),
            EditEffect::Nothing => {}
        }
        self.publish_changed();
    }

    fn arm_autosave(&self, req: SaveRequest) {
        let weak = Rc::downgrade(&self.inner);
        self.inner.autosave.arm(req, move |generation| {
            Box::pin(async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let session = NoteSession { inner };
                let due = session.inner.autosave.take_due(generation);
                if let Some(req) = due {
                    let _ = session.run_save(req, SaveTrigger::Autosave).await;
                }
            })
        });
    }

    fn spawn_save(&self, req: SaveRequest, trigger: SaveTrigger) {
        let session = self.clone();
        self.inner.runtime.spawn(Box::pin(async move {
            let _ = session.run_save(req, trigger).await;
        }));
    }

    /// Explicit save (button or shortcut).
    pub async fn save_now(&self) -> Result<SaveOutcome, SessionError> {
        let req = self.inner.draft.borrow().save_request();
        let Some(req) = req else {
            self.inner.notifier.notify(Notice::info("Nothing to save"));
            return Ok(SaveOutcome::NothingSelected);
        };

        self.inner.autosave.cancel();
        self.run_save(req, SaveTrigger::Manual).await
    }

    async fn run_save(
        &self,
        req: SaveRequest,
        trigger: SaveTrigger,
    ) -> Result<SaveOutcome, SessionError> {
        let unchanged = {
            let mut d = self.inner.draft.borrow_mut();
            let unchanged = d.epoch == req.epoch && d.last_persisted == req.fields;
            if unchanged {
                d.recompute_dirty();
            } else {
                d.saves_in_flight += 1;
            }
            unchanged
        };

        if unchanged {
            if trigger.announces_success() {
                self.inner.notifier.notify(Notice::success("Note saved"));
            }
            self.publish_changed();
            return Ok(SaveOutcome::Unchanged);
        }
        self.publish_changed();

        tracing::debug!(note_id = %req.note_id, ?trigger, "saving note");
        let result = self
            .inner
            .store
            .update(&req.note_id, NotePatch::from(req.fields.clone()))
            .await;

        let current = {
            let mut d = self.inner.draft.borrow_mut();
            d.saves_in_flight = d.saves_in_flight.saturating_sub(1);
            let current = d.epoch == req.epoch;
            if current && result.is_ok() {
                d.last_persisted = req.fields.clone();
                // Still dirty if the user kept typing while the request was out.
                d.recompute_dirty();
            }
            current
        };

        match result {
            Ok(note) => {
                if !current {
                    tracing::debug!(note_id = %req.note_id, "save finished after selection changed");
                    self.adopt_settled_save(&note);
                }
                if trigger.announces_success() {
                    self.inner.notifier.notify(Notice::success("Note saved"));
                }
                self.emit(&SessionEvent::Saved(note));
                self.publish_changed();
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                tracing::warn!(note_id = %req.note_id, error = %e, "saving note failed");
                self.inner
                    .notifier
                    .notify(Notice::error(format!("Couldn't save note: {e}")));
                self.publish_changed();
                Err(SessionError::Save(e))
            }
        }
    }

    /// A save requested under an earlier selection landed while its note is
    /// selected again. The draft was loaded from the pre-save record, so fields
    /// the user has not touched since take the stored values and the snapshot
    /// moves to the stored record.
    fn adopt_settled_save(&self, note: &Note) {
        let (effect, replaced_content) = {
            let mut d = self.inner.draft.borrow_mut();
            if d.note_id.as_deref() != Some(note.id.as_str()) {
                return;
            }

            let stored = note.fields();
            let mut replaced_content = None;
            if d.fields.title == d.last_persisted.title {
                d.fields.title = stored.title.clone();
            }
            if d.fields.content == d.last_persisted.content && d.fields.content != stored.content {
                d.fields.content = stored.content.clone();
                replaced_content = Some(stored.content.clone());
            }
            d.last_persisted = stored;
            d.recompute_dirty();

            let effect = match d.save_request() {
                Some(req) if d.dirty => EditEffect::Arm(req),
                _ => EditEffect::Disarm,
            };
            (effect, replaced_content)
        };

        if let Some(html) = replaced_content {
            self.inner.surface.set_content(&html);
        }
        match effect {
            EditEffect::Arm(req) => self.arm_autosave(req),
            EditEffect::Disarm => self.inner.autosave.cancel(),
            EditEffect::Nothing => {}
        }
    }

    /// Flip between preview and edit. Unsaved edits are saved first; a failed
    /// save never keeps the user stuck in edit mode.
    pub async fn toggle_mode(&self) {
        let (epoch, save) = {
            let d = self.inner.draft.borrow();
            let save = if d.mode == Mode::Edit && d.dirty {
                d.save_request()
            } else {
                None
            };
            (d.epoch, save)
        };

        if let Some(req) = save {
            self.inner.autosave.cancel();
            let _ = self.run_save(req, SaveTrigger::Toggle).await;
        }

        let mode = {
            let mut d = self.inner.draft.borrow_mut();
            if d.epoch != epoch {
                None
            } else {
                d.mode = match d.mode {
                    Mode::Edit => Mode::Preview,
                    Mode::Preview => Mode::Edit,
                };
                Some(d.mode)
            }
        };

        let Some(mode) = mode else {
            tracing::debug!("selection changed during toggle; mode left alone");
            return;
        };
        self.inner.surface.set_enabled(mode == Mode::Edit);
        self.publish_changed();
    }

    /// Interaction with the read-only preview: start editing.
    pub fn enter_edit(&self) {
        {
            let mut d = self.inner.draft.borrow_mut();
            if d.mode == Mode::Edit {
                return;
            }
            d.mode = Mode::Edit;
        }
        self.inner.surface.set_enabled(true);
        self.publish_changed();
    }

    /// Delete the selected note. On success the session falls back to the
    /// empty draft; on failure nothing changes.
    pub async fn delete(&self) -> Result<Option<String>, SessionError> {
        let (id, epoch) = {
            let d = self.inner.draft.borrow();
            (d.note_id.clone(), d.epoch)
        };
        let Some(id) = id else {
            self.inner.notifier.notify(Notice::info("No note selected"));
            return Ok(None);
        };

        match self.inner.store.delete(&id).await {
            Ok(()) => {
                tracing::info!(note_id = %id, "note deleted");
                self.inner.notifier.notify(Notice::success("Note deleted"));

                let still_selected = self.inner.draft.borrow().epoch == epoch;
                if still_selected {
                    // Nothing left to autosave into.
                    self.inner.autosave.cancel();
                }
                self.emit(&SessionEvent::Deleted(id.clone()));
                if still_selected {
                    self.select(None);
                }
                Ok(Some(id))
            }
            Err(e) => {
                tracing::warn!(note_id = %id, error = %e, "deleting note failed");
                self.inner
                    .notifier
                    .notify(Notice::error(format!("Couldn't delete note: {e}")));
                Err(SessionError::Delete(e))
            }
        }
    }

    /// Push the draft into a surface that just became ready.
    fn sync_surface(&self) {
        let (content, mode) = {
            let d = self.inner.draft.borrow();
            (d.fields.content.clone(), d.mode)
        };
        self.inner.surface.set_content(&content);
        self.inner.surface.set_enabled(mode == Mode::Edit);
    }

    fn emit(&self, event: &SessionEvent) {
        let listeners = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }

    fn publish_changed(&self) {
        let view = self.view();
        self.emit(&SessionEvent::Changed(view));
    }
}
