use crate::components::toast::ToastStack;
use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Spinner};
use crate::feedback::{Notice, Notifier};
use crate::state::note_session::Mode;
use crate::state::AppContext;
use crate::surface::quill::QuillWidget;
use crate::util::excerpt;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::components::Outlet;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

const EDITOR_PLACEHOLDER: &str = "Start writing…";
const EXCERPT_CHARS: usize = 80;

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub note_id: Option<String>,
}

/// `/notes/:note_id`: publishes the routed note id as the selection.
#[component]
pub fn NoteRoute() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<NoteRouteParams>();
    let route_note_id = app_state.0.route_note_id;

    Effect::new(move |_| {
        let id = params
            .get()
            .ok()
            .and_then(|p| p.note_id)
            .filter(|id| !id.trim().is_empty());
        route_note_id.set(id);
    });
}

/// `/`: nothing selected.
#[component]
pub fn NoNoteRoute() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let route_note_id = app_state.0.route_note_id;

    Effect::new(move |_| route_note_id.set(None));
}

#[component]
pub fn NotesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let session = app_state.0.session;
    let draft = app_state.0.draft;
    let notes = app_state.0.notes;
    let notes_loading = app_state.0.notes_loading;
    let notes_error = app_state.0.notes_error;
    let route_note_id = app_state.0.route_note_id;
    let notifier = app_state.0.notifier;

    app_state.0.reload_notes();

    // Follow the route. Only the route and the list's load state are tracked,
    // so list refreshes after a save never reselect the open note.
    {
        let state = app_state.0.clone();
        Effect::new(move |_| {
            let wanted = route_note_id.get();
            let loading = notes_loading.get();
            let load_failed = notes_error.get().is_some();

            let current = session.with_value(|s| s.selected_id());
            if wanted == current {
                return;
            }

            let Some(id) = wanted else {
                session.with_value(|s| s.select(None));
                return;
            };

            match state.find_note(&id) {
                Some(note) => session.with_value(|s| s.select(Some(&note))),
                None if loading || load_failed => {}
                None => {
                    tracing::info!(%id, "routed note not in list");
                    notifier.notify(Notice::error("Note not found"));
                    navigate.with_value(|nav| nav("/", Default::default()));
                }
            }
        });
    }

    let editor_host: NodeRef<html::Div> = NodeRef::new();
    Effect::new(move |_| {
        let Some(host) = editor_host.get() else {
            return;
        };
        session.with_value(|s| s.mount_surface(|| QuillWidget::new(&host, EDITOR_PLACEHOLDER)));
    });

    let save_now = move || {
        let s = session.get_value();
        spawn_local(async move {
            let _ = s.save_now().await;
        });
    };

    let toggle_mode = move || {
        let s = session.get_value();
        spawn_local(async move { s.toggle_mode().await });
    };

    let delete_note = move || {
        let s = session.get_value();
        spawn_local(async move {
            if let Ok(Some(_)) = s.delete().await {
                navigate.with_value(|nav| nav("/", Default::default()));
            }
        });
    };

    let create_note = {
        let state = app_state.0.clone();
        move || {
            let state = state.clone();
            spawn_local(async move {
                if let Some(note) = state.create_note().await {
                    navigate.with_value(|nav| nav(&format!("/notes/{}", note.id), Default::default()));
                }
            });
        }
    };

    // Keyboard shortcuts:
    // - Cmd/Ctrl+S: save now
    // - Cmd/Ctrl+E: toggle edit/preview
    let _key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        let is_meta = ev.meta_key() || ev.ctrl_key();
        if !is_meta || ev.alt_key() {
            return;
        }

        match ev.key().to_lowercase().as_str() {
            "s" => {
                ev.prevent_default();
                save_now();
            }
            "e" => {
                ev.prevent_default();
                toggle_mode();
            }
            _ => {}
        }
    });

    let is_preview = move || draft.with(|d| d.mode == Mode::Preview);
    let has_selection = move || draft.with(|d| d.note_id.is_some());

    let status_label = move || {
        draft.with(|d| {
            if d.note_id.is_none() {
                ""
            } else if d.dirty {
                "Unsaved changes"
            } else {
                "Saved"
            }
        })
    };

    view! {
        <div class="flex h-screen w-full overflow-hidden bg-background text-foreground">
            <aside class="flex w-72 shrink-0 flex-col border-r">
                <div class="flex items-center justify-between gap-2 border-b px-3 py-2">
                    <span class="text-sm font-semibold">"Notes"</span>
                    <Button size=ButtonSize::Sm on:click=move |_| create_note()>
                        "New note"
                    </Button>
                </div>

                <div class="min-h-0 flex-1 overflow-y-auto p-2">
                    <Show when=move || notes_error.get().is_some() fallback=|| ().into_view()>
                        <Alert class="mb-2">
                            <AlertDescription>
                                {move || notes_error.get().unwrap_or_default()}
                            </AlertDescription>
                        </Alert>
                    </Show>

                    <Show
                        when=move || !notes_loading.get() || !notes.with(|l| l.is_empty())
                        fallback=|| view! {
                            <div class="flex items-center gap-2 px-2 py-4 text-xs text-muted-foreground">
                                <Spinner label="Loading notes" />
                                "Loading notes…"
                            </div>
                        }
                    >
                        <Show
                            when=move || !notes.with(|l| l.is_empty())
                            fallback=|| view! {
                                <div class="px-2 py-4 text-xs text-muted-foreground">"No notes yet."</div>
                            }
                        >
                            <ul class="flex flex-col gap-1">
                                <For
                                    each=move || notes.get()
                                    key=|n| (n.id.clone(), n.updated_at.clone(), n.title.clone())
                                    children=move |n| {
                                        let id = n.id.clone();
                                        let is_selected = move || {
                                            draft.with(|d| d.note_id.as_deref() == Some(id.as_str()))
                                        };
                                        let title = if n.title.trim().is_empty() {
                                            "Untitled".to_string()
                                        } else {
                                            n.title.clone()
                                        };
                                        let preview = excerpt(&n.content, EXCERPT_CHARS);

                                        view! {
                                            <li>
                                                <Button
                                                    variant=ButtonVariant::Ghost
                                                    class="h-auto w-full flex-col items-start gap-0.5 py-2 text-left aria-[current=page]:bg-accent"
                                                    attr:aria-current=move || {
                                                        if is_selected() { Some("page") } else { None }
                                                    }
                                                    href=format!("/notes/{}", n.id)
                                                >
                                                    <span class="w-full truncate font-medium">{title}</span>
                                                    <span class="w-full truncate text-xs text-muted-foreground">{preview}</span>
                                                </Button>
                                            </li>
                                        }
                                    }
                                />
                            </ul>
                        </Show>
                    </Show>
                </div>
            </aside>

            <main class="flex min-w-0 flex-1 flex-col">
                <div class="flex items-center gap-2 border-b px-4 py-2">
                    <input
                        class="min-w-0 flex-1 bg-transparent text-lg font-semibold outline-none read-only:cursor-pointer"
                        placeholder="Title"
                        prop:value=move || draft.with(|d| d.title.clone())
                        readonly=is_preview
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            session.with_value(|s| s.edit_title(&value));
                        }
                        on:click=move |_| {
                            if is_preview() {
                                session.with_value(|s| s.enter_edit());
                            }
                        }
                    />

                    <span class="flex items-center gap-1.5 text-xs text-muted-foreground">
                        <Show when=move || draft.with(|d| d.saving) fallback=|| ().into_view()>
                            <Spinner class="size-3" label="Saving" />
                        </Show>
                        {status_label}
                    </span>

                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !has_selection()
                        on:click=move |_| toggle_mode()
                    >
                        {move || if is_preview() { "Edit" } else { "Preview" }}
                    </Button>
                    <Button size=ButtonSize::Sm on:click=move |_| save_now()>
                        "Save"
                    </Button>
                    <Button
                        variant=ButtonVariant::Destructive
                        size=ButtonSize::Sm
                        on:click=move |_| delete_note()
                    >
                        "Delete"
                    </Button>
                </div>

                <div
                    class="min-h-0 flex-1 overflow-y-auto"
                    data-mode=move || draft.with(|d| d.mode.to_string())
                    on:click=move |_| {
                        if is_preview() {
                            session.with_value(|s| s.enter_edit());
                        }
                    }
                >
                    <div node_ref=editor_host class="h-full"></div>
                </div>
            </main>

            <ToastStack />
            <Outlet />
        </div>
    }
}
