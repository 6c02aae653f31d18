use crate::models::{Note, NotePatch};

#[cfg(test)]
pub(crate) mod memory;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("note not found")]
    NotFound,
    #[error("not allowed to modify this note")]
    Forbidden,
    #[error("note store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn unavailable(e: impl std::fmt::Display) -> Self {
        Self::Unavailable(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Typed contract of the remote note store.
///
/// The app runs on a single-threaded event loop, so futures are not required
/// to be `Send`. Implementations are cheap handles (`Clone`) shared by the
/// note list and the editor session.
#[allow(async_fn_in_trait)]
pub trait NoteStore: Clone + 'static {
    /// All notes visible to the caller, most recently updated first.
    async fn list(&self) -> StoreResult<Vec<Note>>;

    async fn create(&self, title: &str, content: &str, owner_id: &str) -> StoreResult<Note>;

    async fn update(&self, id: &str, patch: NotePatch) -> StoreResult<Note>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}
