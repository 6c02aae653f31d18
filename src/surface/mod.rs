//! Adapter between the note session and a third-party WYSIWYG widget.
//!
//! The widget only has to satisfy [`EditorWidget`]; everything the session
//! relies on (idempotent mount, one-shot readiness, clear-then-insert content
//! replacement, empty normalization, user-only change notifications) is
//! enforced here so it holds for any widget.

pub mod quill;

#[cfg(test)]
pub(crate) mod fake;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("rich text editor failed to initialize: {0}")]
    InitFailure(String),
    #[error("content could not be loaded into the editor: {0}")]
    ContentInjection(String),
}

/// Who caused a content change reported by the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeSource {
    User,
    Program,
}

pub trait EditorWidget: 'static {
    /// Remove all content, leaving the widget's canonical empty document.
    fn clear(&self);

    /// Insert markup into an empty document.
    fn insert_html(&self, html: &str) -> Result<(), SurfaceError>;

    fn html(&self) -> String;

    fn set_read_only(&self, read_only: bool);

    fn focus(&self);

    fn blur(&self);

    /// Register the single change hook. Called once, before the widget is
    /// handed to the surface.
    fn on_text_change(&mut self, listener: Box<dyn Fn(ChangeSource)>);
}

/// Map the widget's canonical empty document back to `""`.
pub fn normalize_empty(html: &str) -> String {
    let trimmed = html.trim();
    match trimmed {
        "" | "<p></p>" | "<p><br></p>" | "<p><br/></p>" | "<p><br /></p>" => String::new(),
        _ => html.to_string(),
    }
}

enum SurfaceState<W> {
    Unmounted,
    Ready(W),
}

struct Shared<W> {
    state: RefCell<SurfaceState<W>>,
    // Set while we are mutating content ourselves; changes seen meanwhile are ours.
    applying: Cell<bool>,
    change_listeners: RefCell<Vec<Rc<dyn Fn(&str)>>>,
    ready_listeners: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl<W: EditorWidget> Shared<W> {
    fn dispatch_change(&self, source: ChangeSource) {
        if source != ChangeSource::User || self.applying.get() {
            return;
        }

        let html = match &*self.state.borrow() {
            SurfaceState::Ready(widget) => normalize_empty(&widget.html()),
            SurfaceState::Unmounted => return,
        };

        let listeners = self.change_listeners.borrow().clone();
        for listener in listeners {
            listener(&html);
        }
    }
}

pub struct RichTextSurface<W> {
    shared: Rc<Shared<W>>,
}

impl<W> Clone for RichTextSurface<W> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<W: EditorWidget> Default for RichTextSurface<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: EditorWidget> RichTextSurface<W> {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(SurfaceState::Unmounted),
                applying: Cell::new(false),
                change_listeners: RefCell::new(vec![]),
                ready_listeners: RefCell::new(vec![]),
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.shared.state.borrow(), SurfaceState::Ready(_))
    }

    /// Construct the widget unless one already exists.
    ///
    /// Returns `Ok(true)` when this call created the widget, `Ok(false)` when
    /// the surface was already mounted. A failed construction leaves the
    /// surface unmounted so a later call may retry.
    pub fn mount(
        &self,
        build: impl FnOnce() -> Result<W, SurfaceError>,
    ) -> Result<bool, SurfaceError> {
        if self.is_ready() {
            tracing::debug!("rich text surface already mounted");
            return Ok(false);
        }

        let mut widget = build().map_err(|e| {
            tracing::error!(error = %e, "rich text surface unavailable");
            e
        })?;

        let weak: Weak<Shared<W>> = Rc::downgrade(&self.shared);
        widget.on_text_change(Box::new(move |source| {
            if let Some(shared) = weak.upgrade() {
                shared.dispatch_change(source);
            }
        }));

        *self.shared.state.borrow_mut() = SurfaceState::Ready(widget);
        tracing::debug!("rich text surface ready");

        let ready = std::mem::take(&mut *self.shared.ready_listeners.borrow_mut());
        for listener in ready {
            listener();
        }
        Ok(true)
    }

    /// Run `f` once the surface is ready (immediately if it already is).
    pub fn on_ready(&self, f: impl FnOnce() + 'static) {
        if self.is_ready() {
            f();
        } else {
            self.shared.ready_listeners.borrow_mut().push(Box::new(f));
        }
    }

    /// Replace the whole document. Failures are logged; whatever the widget
    /// managed to apply stays in place.
    pub fn set_content(&self, html: &str) {
        let state = self.shared.state.borrow();
        let SurfaceState::Ready(widget) = &*state else {
            return;
        };

        self.shared.applying.set(true);
        widget.clear();
        let result = if html.is_empty() {
            Ok(())
        } else {
            widget.insert_html(html)
        };
        self.shared.applying.set(false);

        if let Err(e) = result {
            tracing::warn!(error = %e, len = html.len(), "editor content injection failed");
        }
    }

    pub fn content(&self) -> String {
        match &*self.shared.state.borrow() {
            SurfaceState::Ready(widget) => normalize_empty(&widget.html()),
            SurfaceState::Unmounted => String::new(),
        }
    }

    /// Toggle editability. Enabling also asks for focus, disabling for blur;
    /// both are dropped when the widget does not exist yet.
    pub fn set_enabled(&self, enabled: bool) {
        let state = self.shared.state.borrow();
        let SurfaceState::Ready(widget) = &*state else {
            tracing::trace!(enabled, "surface not ready; enable request dropped");
            return;
        };

        widget.set_read_only(!enabled);
        if enabled {
            widget.focus();
        } else {
            widget.blur();
        }
    }

    /// Listen for edits made by the user. Programmatic content changes never
    /// reach these listeners.
    pub fn on_user_change(&self, f: impl Fn(&str) + 'static) {
        self.shared.change_listeners.borrow_mut().push(Rc::new(f));
    }
}
