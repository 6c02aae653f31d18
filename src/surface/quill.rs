use super::{ChangeSource, EditorWidget, SurfaceError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// Quill is loaded as a global from index.html.
#[wasm_bindgen]
extern "C" {
    type Quill;

    #[wasm_bindgen(constructor, catch)]
    fn new(container: &web_sys::HtmlElement, options: &JsValue) -> Result<Quill, JsValue>;

    #[wasm_bindgen(method, js_name = setText)]
    fn set_text(this: &Quill, text: &str, source: &str);

    #[wasm_bindgen(method, getter)]
    fn root(this: &Quill) -> web_sys::HtmlElement;

    #[wasm_bindgen(method, getter)]
    fn clipboard(this: &Quill) -> QuillClipboard;

    #[wasm_bindgen(method)]
    fn enable(this: &Quill, enabled: bool);

    #[wasm_bindgen(method, js_name = focus)]
    fn focus_editor(this: &Quill);

    #[wasm_bindgen(method, js_name = blur)]
    fn blur_editor(this: &Quill);

    #[wasm_bindgen(method)]
    fn on(this: &Quill, event: &str, handler: &js_sys::Function);

    type QuillClipboard;

    #[wasm_bindgen(method, catch, js_name = dangerouslyPasteHTML)]
    fn dangerously_paste_html(
        this: &QuillClipboard,
        html: &str,
        source: &str,
    ) -> Result<(), JsValue>;
}

const QUILL_OPTIONS: &str = r#"{
    "theme": "snow",
    "modules": {
        "toolbar": [
            [{ "header": [1, 2, 3, false] }],
            ["bold", "italic", "underline", "strike"],
            [{ "list": "ordered" }, { "list": "bullet" }],
            ["blockquote", "code-block", "link"],
            ["clean"]
        ]
    }
}"#;

// Changes we make ourselves are tagged "api" so they can be told apart.
const API_SOURCE: &str = "api";

fn js_error_message(e: &JsValue) -> String {
    if let Some(err) = e.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

pub struct QuillWidget {
    quill: Quill,
    _text_change: Option<Closure<dyn Fn(JsValue, JsValue, JsValue)>>,
}

impl QuillWidget {
    pub fn new(host: &web_sys::HtmlElement, placeholder: &str) -> Result<Self, SurfaceError> {
        let options = js_sys::JSON::parse(QUILL_OPTIONS)
            .map_err(|e| SurfaceError::InitFailure(js_error_message(&e)))?;
        let _ = js_sys::Reflect::set(&options, &"placeholder".into(), &placeholder.into());

        let quill =
            Quill::new(host, &options).map_err(|e| SurfaceError::InitFailure(js_error_message(&e)))?;

        Ok(Self {
            quill,
            _text_change: None,
        })
    }
}

impl EditorWidget for QuillWidget {
    fn clear(&self) {
        self.quill.set_text("", API_SOURCE);
    }

    fn insert_html(&self, html: &str) -> Result<(), SurfaceError> {
        self.quill
            .clipboard()
            .dangerously_paste_html(html, API_SOURCE)
            .map_err(|e| SurfaceError::ContentInjection(js_error_message(&e)))
    }

    fn html(&self) -> String {
        self.quill.root().inner_html()
    }

    fn set_read_only(&self, read_only: bool) {
        self.quill.enable(!read_only);
    }

    fn focus(&self) {
        self.quill.focus_editor();
    }

    fn blur(&self) {
        self.quill.blur_editor();
    }

    fn on_text_change(&mut self, listener: Box<dyn Fn(ChangeSource)>) {
        let cb = Closure::wrap(Box::new(move |_delta: JsValue, _old: JsValue, source: JsValue| {
            let source = match source.as_string().as_deref() {
                Some("user") => ChangeSource::User,
                _ => ChangeSource::Program,
            };
            listener(source);
        }) as Box<dyn Fn(JsValue, JsValue, JsValue)>);

        self.quill.on("text-change", cb.as_ref().unchecked_ref());
        self._text_change = Some(cb);
    }
}
