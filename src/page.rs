use crate::Result;
use crate::session::CookieEntry;
use async_trait::async_trait;
use std::path::Path;

/// The controllable page seam. Production drives a Chromium tab over CDP
/// (see `browser::BrowserContext`); tests script it in memory.
///
/// All waits exposed here are cooperative suspension points. Only
/// `wait_for_element` is bounded; `wait_for_navigation` has no deadline so a
/// human can resolve a CAPTCHA or 2FA challenge mid-flow. Callers wanting
/// bounded behavior wrap calls with `wait::with_options`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Blocks until an element matching `selector` exists in the rendered
    /// document, polling up to `timeout_ms`.
    async fn wait_for_element(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Gives the element keyboard focus.
    async fn focus(&self, selector: &str) -> Result<()>;

    /// Emits one unit of text into the focused element. The gesture layer
    /// calls this once per character to produce a typing cadence.
    async fn insert_text(&self, text: &str) -> Result<()>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Advances the document scroll position by `amount` pixels.
    async fn scroll_by(&self, amount: i64) -> Result<()>;

    async fn cookies(&self) -> Result<Vec<CookieEntry>>;

    async fn set_cookies(&self, cookies: &[CookieEntry]) -> Result<()>;

    /// Attaches a local file to a file-selection control.
    async fn set_file_input(&self, selector: &str, path: &Path) -> Result<()>;

    /// Resolves when the next full page navigation settles. Unbounded.
    async fn wait_for_navigation(&self) -> Result<()>;
}
