//! Scriptable `EditorWidget` for tests. Behaves like Quill where it matters:
//! clearing leaves `<p><br></p>` and programmatic inserts emit a change
//! event tagged as non-user.

use super::{ChangeSource, EditorWidget, SurfaceError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const EMPTY_DOC: &str = "<p><br></p>";

struct FakeInner {
    html: RefCell<String>,
    read_only: Cell<bool>,
    clear_calls: Cell<u32>,
    focus_calls: Cell<u32>,
    blur_calls: Cell<u32>,
    fail_next_insert: Cell<bool>,
    listener: RefCell<Option<Box<dyn Fn(ChangeSource)>>>,
}

#[derive(Clone)]
pub(crate) struct FakeWidget {
    inner: Rc<FakeInner>,
}

impl Default for FakeWidget {
    fn default() -> Self {
        Self {
            inner: Rc::new(FakeInner {
                html: RefCell::new(EMPTY_DOC.to_string()),
                read_only: Cell::new(false),
                clear_calls: Cell::new(0),
                focus_calls: Cell::new(0),
                blur_calls: Cell::new(0),
                fail_next_insert: Cell::new(false),
                listener: RefCell::new(None),
            }),
        }
    }
}

impl FakeWidget {
    fn emit(&self, source: ChangeSource) {
        if let Some(listener) = self.inner.listener.borrow().as_ref() {
            listener(source);
        }
    }

    /// Simulate the user replacing the document through the UI.
    pub(crate) fn type_html(&self, html: &str) {
        *self.inner.html.borrow_mut() = html.to_string();
        self.emit(ChangeSource::User);
    }

    pub(crate) fn raw_html(&self) -> String {
        self.inner.html.borrow().clone()
    }

    pub(crate) fn fail_next_insert(&self) {
        self.inner.fail_next_insert.set(true);
    }

    pub(crate) fn read_only(&self) -> bool {
        self.inner.read_only.get()
    }

    pub(crate) fn clear_calls(&self) -> u32 {
        self.inner.clear_calls.get()
    }

    pub(crate) fn focus_calls(&self) -> u32 {
        self.inner.focus_calls.get()
    }

    pub(crate) fn blur_calls(&self) -> u32 {
        self.inner.blur_calls.get()
    }
}

impl EditorWidget for FakeWidget {
    fn clear(&self) {
        self.inner.clear_calls.set(self.inner.clear_calls.get() + 1);
        *self.inner.html.borrow_mut() = EMPTY_DOC.to_string();
        self.emit(ChangeSource::Program);
    }

    fn insert_html(&self, html: &str) -> Result<(), SurfaceError> {
        if self.inner.fail_next_insert.replace(false) {
            return Err(SurfaceError::ContentInjection("unbalanced markup".into()));
        }
        *self.inner.html.borrow_mut() = html.to_string();
        self.emit(ChangeSource::Program);
        Ok(())
    }

    fn html(&self) -> String {
        self.inner.html.borrow().clone()
    }

    fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.set(read_only);
    }

    fn focus(&self) {
        self.inner.focus_calls.set(self.inner.focus_calls.get() + 1);
    }

    fn blur(&self) {
        self.inner.blur_calls.set(self.inner.blur_calls.get() + 1);
    }

    fn on_text_change(&mut self, listener: Box<dyn Fn(ChangeSource)>) {
        *self.inner.listener.borrow_mut() = Some(listener);
    }
}
