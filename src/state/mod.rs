pub mod note_session;

use crate::api::{ApiClient, EnvConfig};
use crate::components::toast::{Toast, ToastNotifier};
use crate::feedback::{Notice, Notifier};
use crate::models::{sort_most_recent_first, Note, NoteFields};
use crate::runtime::BrowserRuntime;
use crate::storage::load_owner_id;
use crate::store::NoteStore;
use crate::surface::quill::QuillWidget;
use crate::util::next_untitled_title;
use leptos::prelude::*;
use leptos::task::spawn_local;
use note_session::{DraftView, NoteSession, SessionEvent};

pub(crate) type BrowserSession = NoteSession<ApiClient, QuillWidget, BrowserRuntime>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: StoredValue<ApiClient, LocalStorage>,

    /// Most recently updated first.
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,
    /// Ignore list responses that arrive after a newer request was issued.
    pub notes_request_id: RwSignal<u64>,

    /// Note id from the current route; the selection the session follows.
    pub route_note_id: RwSignal<Option<String>>,

    /// Mirror of the session's draft, republished after every transition.
    pub draft: RwSignal<DraftView>,
    pub toasts: RwSignal<Vec<Toast>>,
    pub notifier: ToastNotifier,

    pub session: StoredValue<BrowserSession, LocalStorage>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        let api_client = ApiClient::load_from_storage(&config);
        if !api_client.is_authenticated() {
            tracing::info!("no session token stored; using the public api key");
        }

        let toasts = RwSignal::new(vec![]);
        let notifier = ToastNotifier::new(toasts);

        let session = NoteSession::new(
            api_client.clone(),
            BrowserRuntime,
            notifier,
            config.autosave_quiet_period(),
        );

        let notes = RwSignal::new(vec![]);
        let draft = RwSignal::new(session.view());

        session.subscribe(move |event| match event {
            SessionEvent::Changed(view) => draft.set(view.clone()),
            SessionEvent::Saved(note) => notes.update(|list| apply_saved(list, note.clone())),
            SessionEvent::Deleted(id) => notes.update(|list| apply_deleted(list, id)),
        });

        Self {
            api_client: StoredValue::new_local(api_client),
            notes,
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            notes_request_id: RwSignal::new(0),
            route_note_id: RwSignal::new(None),
            draft,
            toasts,
            notifier,
            session: StoredValue::new_local(session),
        }
    }

    pub fn reload_notes(&self) {
        let request_id = self.notes_request_id.get_untracked() + 1;
        self.notes_request_id.set(request_id);
        self.notes_loading.set(true);
        self.notes_error.set(None);

        let state = self.clone();
        spawn_local(async move {
            let client = state.api_client.get_value();
            let result = client.list().await;

            if state.notes_request_id.get_untracked() != request_id {
                return;
            }

            match result {
                Ok(mut list) => {
                    sort_most_recent_first(&mut list);
                    tracing::debug!(count = list.len(), "notes loaded");
                    state.notes.set(list);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "listing notes failed");
                    state.notes_error.set(Some(format!("Couldn't load notes: {e}")));
                }
            }
            state.notes_loading.set(false);
        });
    }

    /// Create a note from the unsaved draft, or an empty one under the next
    /// free "Untitled" title.
    pub async fn create_note(&self) -> Option<Note> {
        let draft = self.session.with_value(|s| s.view());
        let fields = self
            .notes
            .with_untracked(|list| new_note_fields(&draft, list));
        let owner_id = load_owner_id();
        let client = self.api_client.get_value();

        match client.create(&fields.title, &fields.content, &owner_id).await {
            Ok(note) => {
                tracing::info!(id = %note.id, "note created");
                self.notes.update(|list| apply_saved(list, note.clone()));
                Some(note)
            }
            Err(e) => {
                tracing::warn!(error = %e, "creating note failed");
                self.notifier
                    .notify(Notice::error(format!("Couldn't create note: {e}")));
                None
            }
        }
    }

    pub fn find_note(&self, id: &str) -> Option<Note> {
        self.notes
            .with_untracked(|list| list.iter().find(|n| n.id == id).cloned())
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

/// Title and content for a new note. Edits typed with nothing selected are
/// carried over instead of being dropped.
pub(crate) fn new_note_fields(draft: &DraftView, existing: &[Note]) -> NoteFields {
    if draft.note_id.is_some() || !draft.dirty {
        return NoteFields::new(next_untitled_title(existing), "");
    }

    let title = match draft.title.trim() {
        "" => next_untitled_title(existing),
        t => t.to_string(),
    };
    NoteFields::new(title, draft.content.clone())
}

/// Replace (or add) the saved note and move it to the top of the list.
pub(crate) fn apply_saved(list: &mut Vec<Note>, note: Note) {
    list.retain(|n| n.id != note.id);
    list.insert(0, note);
}

pub(crate) fn apply_deleted(list: &mut Vec<Note>, id: &str) {
    list.retain(|n| n.id != id);
}
