use crate::feedback::{Notice, NoticeLevel, Notifier};
use gloo_timers::callback::Timeout;
use icons::{Check, ChevronRight, X};
use leptos::prelude::*;
use tw_merge::tw_merge;

const TOAST_TTL_MS: u32 = 4000;
const MAX_TOASTS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Toast {
    pub id: u64,
    pub notice: Notice,
}

/// Keep the newest `max` toasts.
pub(crate) fn push_toast(list: &mut Vec<Toast>, toast: Toast, max: usize) {
    list.push(toast);
    if list.len() > max {
        let overflow = list.len() - max;
        list.drain(..overflow);
    }
}

/// `Notifier` that renders notices as auto-dismissing toasts.
#[derive(Clone, Copy)]
pub(crate) struct ToastNotifier {
    toasts: RwSignal<Vec<Toast>>,
    next_id: StoredValue<u64>,
}

impl ToastNotifier {
    pub fn new(toasts: RwSignal<Vec<Toast>>) -> Self {
        Self {
            toasts,
            next_id: StoredValue::new(0),
        }
    }

    pub fn dismiss(&self, id: u64) {
        self.toasts.update(|list| list.retain(|t| t.id != id));
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notice: Notice) {
        let id = self.next_id.get_value() + 1;
        self.next_id.set_value(id);
        tracing::debug!(level = %notice.level, message = %notice.message, "notice");

        self.toasts
            .update(|list| push_toast(list, Toast { id, notice }, MAX_TOASTS));

        let this = *self;
        Timeout::new(TOAST_TTL_MS, move || this.dismiss(id)).forget();
    }
}

#[component]
pub fn ToastStack() -> impl IntoView {
    let app_state = expect_context::<crate::state::AppContext>();
    let toasts = app_state.0.toasts;
    let notifier = app_state.0.notifier;

    view! {
        <div class="fixed bottom-4 right-4 z-50 flex w-80 flex-col gap-2" aria-live="polite">
            <For
                each=move || toasts.get()
                key=|t| t.id
                children=move |t: Toast| {
                    let id = t.id;
                    let level = t.notice.level;
                    let tone = match level {
                        NoticeLevel::Success => "border-success/40",
                        NoticeLevel::Info => "border-border",
                        NoticeLevel::Error => "border-destructive/50 text-destructive",
                    };
                    let class = tw_merge!(
                        "flex items-start gap-2 rounded-md border bg-background px-3 py-2 text-sm shadow-md",
                        tone
                    );
                    let icon = match level {
                        NoticeLevel::Success => view! { <Check class="mt-0.5 size-4 shrink-0" /> }.into_any(),
                        NoticeLevel::Info => view! { <ChevronRight class="mt-0.5 size-4 shrink-0 opacity-70" /> }.into_any(),
                        NoticeLevel::Error => view! { <X class="mt-0.5 size-4 shrink-0" /> }.into_any(),
                    };

                    view! {
                        <div
                            class=class
                            role="status"
                            data-level=level.as_ref().to_string()
                            on:click=move |_| notifier.dismiss(id)
                        >
                            {icon}
                            <span class="flex-1">{t.notice.message.clone()}</span>
                        </div>
                    }
                }
            />
        </div>
    }
}
