use crate::models::AccountInfo;
use serde::Deserialize;

pub(crate) const TOKEN_KEY: &str = "quillnote_token";
pub(crate) const USER_KEY: &str = "quillnote_user";

pub(crate) fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn load_user_from_storage() -> Option<AccountInfo> {
    load_json_from_storage(USER_KEY)
}

/// Owner id for new notes. Empty when nobody is signed in; the backend's
/// row-level security then rejects the insert.
pub(crate) fn load_owner_id() -> String {
    load_user_from_storage()
        .map(|u| u.id)
        .unwrap_or_default()
}
