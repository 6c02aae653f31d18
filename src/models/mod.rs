use serde::{Deserialize, Serialize};

/// A note row as returned by the backend.
///
/// Timestamps are server-assigned RFC 3339 strings; we never parse them, only
/// compare them for ordering.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Rich markup (HTML). Opaque to everything except the editor widget.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub owner_id: String,
}

impl Note {
    pub fn fields(&self) -> NoteFields {
        NoteFields {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// The editable part of a note: the unit we diff, snapshot and send.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
}

impl NoteFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }
}

/// Partial update body. `None` fields are left untouched by the backend.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<NoteFields> for NotePatch {
    fn from(fields: NoteFields) -> Self {
        Self {
            title: Some(fields.title),
            content: Some(fields.content),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub owner_id: String,
}

/// Signed-in account, as left in localStorage by the sign-in flow.
///
/// Only `id` is required; anything else the auth provider returns is kept.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AccountInfo {
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Sort notes most-recently-updated first; ties keep their relative order.
pub fn sort_most_recent_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
