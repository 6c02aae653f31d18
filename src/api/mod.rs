use crate::autosave::DEFAULT_QUIET_PERIOD;
use crate::models::{NewNote, Note, NotePatch};
use crate::storage::{local_storage, TOKEN_KEY};
use crate::store::{NoteStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:54321";
const DEFAULT_AUTOSAVE_MS: u64 = DEFAULT_QUIET_PERIOD.as_millis() as u64;
const DEFAULT_LOG_LEVEL: &str = "info";
/// Longest delay a browser timer honours; larger values fire at once.
const MAX_AUTOSAVE_MS: u64 = i32::MAX as u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_url: String,
    /// Public (anon) key sent as `apikey`; row-level security does the rest.
    pub api_key: String,
    pub autosave_ms: u64,
    pub log_level: String,
}

impl EnvConfig {
    /// Read `window.ENV`, falling back to defaults for anything missing.
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        Self::from_lookup(|key| {
            let env = env.as_ref()?;
            js_sys::Reflect::get(env, &key.into())
                .ok()
                .and_then(|v| v.as_string().or_else(|| v.as_f64().map(|n| n.to_string())))
        })
    }

    /// Build from a key lookup. Both `API_URL` (documented) and `api_url`
    /// spellings are accepted for every key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |upper: &str| {
            lookup(upper)
                .or_else(|| lookup(&upper.to_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_url: get("API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: get("API_KEY").unwrap_or_default(),
            autosave_ms: get("AUTOSAVE_MS")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .map(|ms| (ms as u64).min(MAX_AUTOSAVE_MS))
                .unwrap_or(DEFAULT_AUTOSAVE_MS),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn autosave_quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// `NoteStore` over a PostgREST-style HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            token: None,
            http: reqwest::Client::new(),
        }
    }

    /// Client for the configured backend, authenticated with the session token
    /// the sign-in flow left in localStorage (if any).
    pub fn load_from_storage(config: &EnvConfig) -> Self {
        let mut client = Self::new(config.api_url.clone(), config.api_key.clone());
        client.token = local_storage()
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
            .filter(|t| !t.trim().is_empty());
        client
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn notes_url(&self) -> String {
        format!("{}/rest/v1/notes", self.base_url.trim_end_matches('/'))
    }

    fn row_url(&self, id: &str) -> String {
        format!("{}?id=eq.{}", self.notes_url(), urlencoding::encode(id))
    }

    fn auth_header(&self) -> String {
        // Without a user session the anon key doubles as the bearer token.
        format!("Bearer {}", self.token.as_deref().unwrap_or(&self.api_key))
    }

    fn with_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", self.auth_header())
    }

    async fn fetch_rows(&self, req: reqwest::RequestBuilder, ctx: &str) -> StoreResult<Vec<Note>> {
        let res = self
            .with_auth_headers(req)
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let err = status_error(status.as_u16(), &body);
            tracing::warn!(%status, ctx, error = %err, "note store request rejected");
            return Err(err);
        }

        res.json::<Vec<Note>>().await.map_err(StoreError::unavailable)
    }
}

/// Map a non-success HTTP status to the store's error kinds.
pub(crate) fn status_error(status: u16, body: &str) -> StoreError {
    match status {
        401 | 403 => StoreError::Forbidden,
        404 => StoreError::NotFound,
        _ => {
            let body = body.trim();
            if body.is_empty() {
                StoreError::Unavailable(format!("HTTP {status}"))
            } else {
                StoreError::Unavailable(format!("HTTP {status}: {body}"))
            }
        }
    }
}

/// PostgREST answers writes with the affected rows; none means the row does
/// not exist for this caller.
pub(crate) fn single_row(rows: Vec<Note>) -> StoreResult<Note> {
    rows.into_iter().next().ok_or(StoreError::NotFound)
}

impl NoteStore for ApiClient {
    async fn list(&self) -> StoreResult<Vec<Note>> {
        let url = format!("{}?select=*&order=updated_at.desc", self.notes_url());
        self.fetch_rows(self.http.get(url), "list").await
    }

    async fn create(&self, title: &str, content: &str, owner_id: &str) -> StoreResult<Note> {
        let body = NewNote {
            title: title.to_string(),
            content: content.to_string(),
            owner_id: owner_id.to_string(),
        };
        let req = self
            .http
            .post(self.notes_url())
            .header("Prefer", "return=representation")
            .json(&body);
        let rows = self.fetch_rows(req, "create").await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("create returned no row".to_string()))
    }

    async fn update(&self, id: &str, patch: NotePatch) -> StoreResult<Note> {
        let req = self
            .http
            .patch(self.row_url(id))
            .header("Prefer", "return=representation")
            .json(&patch);
        single_row(self.fetch_rows(req, "update").await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let req = self
            .http
            .delete(self.row_url(id))
            .header("Prefer", "return=representation");
        single_row(self.fetch_rows(req, "delete").await?).map(|_| ())
    }
}
