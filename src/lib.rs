pub mod api;
mod app;
pub mod autosave;
mod components;
pub mod feedback;
mod logging;
pub mod models;
mod pages;
pub mod runtime;
mod state;
mod storage;
pub mod store;
pub mod surface;
mod util;

pub use app::App;
pub use state::note_session::{DraftView, Mode, NoteSession, SaveOutcome, SessionError, SessionEvent};

use api::EnvConfig;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::storage::{load_owner_id, local_storage, TOKEN_KEY, USER_KEY};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn clear_storage() {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    #[wasm_bindgen_test]
    fn test_api_client_reads_token_from_storage() {
        clear_storage();
        let config = EnvConfig::new();

        let c = ApiClient::load_from_storage(&config);
        assert!(!c.is_authenticated());

        if let Some(storage) = local_storage() {
            let _ = storage.set_item(TOKEN_KEY, "t1");
        }
        let c2 = ApiClient::load_from_storage(&config);
        assert_eq!(c2.token.as_deref(), Some("t1"));

        clear_storage();
    }

    #[wasm_bindgen_test]
    fn test_owner_id_from_stored_user() {
        clear_storage();
        assert_eq!(load_owner_id(), "");

        if let Some(storage) = local_storage() {
            let _ = storage.set_item(USER_KEY, r#"{"id": "user-1", "email": "u@example.com"}"#);
        }
        assert_eq!(load_owner_id(), "user-1");

        clear_storage();
    }

    #[wasm_bindgen_test]
    fn test_spinner_announces_its_label() {
        use crate::components::ui::Spinner;
        use wasm_bindgen::JsCast;

        let document = web_sys::window().and_then(|w| w.document()).expect("document");
        let host = document
            .create_element("div")
            .expect("create div")
            .dyn_into::<web_sys::HtmlElement>()
            .expect("div is an HtmlElement");
        document.body().expect("body").append_child(&host).expect("append host");

        let _mounted = leptos::mount::mount_to(host.clone(), || view! { <Spinner label="Loading notes" /> });

        let spinner = host.query_selector("[role=status]").ok().flatten().expect("spinner");
        assert_eq!(spinner.get_attribute("aria-label").as_deref(), Some("Loading notes"));
    }

    #[wasm_bindgen_test]
    fn test_env_config_without_window_env_uses_defaults() {
        let config = EnvConfig::new();
        assert!(!config.api_url.is_empty());
        assert!(config.autosave_ms > 0);
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    let config = EnvConfig::new();
    logging::init(&config.log_level);
    tracing::info!(
        api_url = %config.api_url,
        autosave_ms = config.autosave_ms,
        "starting quillnote"
    );

    mount_to_body(App);
}
