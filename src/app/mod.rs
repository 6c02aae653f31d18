use crate::api::EnvConfig;
use crate::pages::{NoNoteRoute, NoteRoute, NotesPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{ParentRoute, Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new(EnvConfig::new())));

    // The page is the parent so the editor widget survives route changes;
    // the child routes only publish which note is selected.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <ParentRoute path=path!("") view=NotesPage>
                    <Route path=path!("notes/:note_id") view=NoteRoute />
                    <Route path=path!("") view=NoNoteRoute />
                </ParentRoute>
            </Routes>
        </Router>
    }
}
