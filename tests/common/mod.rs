#![allow(dead_code)]

use async_trait::async_trait;
use feedpilot::auth::ContextFactory;
use feedpilot::config::{Config, PacingConfig};
use feedpilot::page::PageDriver;
use feedpilot::session::CookieEntry;
use feedpilot::{PilotError, Result};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory page scripted for one scenario: tracks the current URL, the
/// cookies visible to the page, and an ordered log of every driver call.
pub struct ScriptedPage {
    events: Mutex<Vec<String>>,
    current_url: Mutex<String>,
    /// navigate(url) lands on the mapped URL instead (site-side redirect).
    redirects: HashMap<String, String>,
    /// URL the next wait_for_navigation settles on; None leaves it in place.
    landing_after_nav: Option<String>,
    /// Cookies the live page reports after a successful login.
    live_cookies: Vec<CookieEntry>,
    /// References the listing extraction script finds.
    listing_refs: Vec<String>,
    /// Script substrings that make presence probes resolve true.
    present_needles: Vec<String>,
    height: AtomicI64,
    height_growth: i64,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            current_url: Mutex::new("about:blank".to_string()),
            redirects: HashMap::new(),
            landing_after_nav: None,
            live_cookies: Vec::new(),
            listing_refs: Vec::new(),
            present_needles: Vec::new(),
            height: AtomicI64::new(1000),
            height_growth: 500,
        }
    }

    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn with_landing_after_nav(mut self, url: &str) -> Self {
        self.landing_after_nav = Some(url.to_string());
        self
    }

    pub fn with_live_cookies(mut self, cookies: Vec<CookieEntry>) -> Self {
        self.live_cookies = cookies;
        self
    }

    pub fn with_listing(mut self, refs: &[&str]) -> Self {
        self.listing_refs = refs.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_present(mut self, needle: &str) -> Self {
        self.present_needles.push(needle.to_string());
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_index(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate:{}", url));
        let landed = self
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        *self.current_url.lock().unwrap() = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current_url.lock().unwrap().clone())
    }

    async fn wait_for_element(&self, selector: &str, _timeout_ms: u64) -> Result<()> {
        self.record(format!("wait:{}", selector));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click:{}", selector));
        Ok(())
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        self.record(format!("focus:{}", selector));
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> Result<()> {
        self.record(format!("insert:{}", text));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        if script.contains("scrollHeight") {
            let previous = self.height.fetch_add(self.height_growth, Ordering::SeqCst);
            return Ok(serde_json::json!(previous + self.height_growth));
        }
        if script.contains("const refs") {
            return Ok(serde_json::json!(self.listing_refs));
        }
        for needle in &self.present_needles {
            if script.contains(needle) {
                return Ok(serde_json::json!(true));
            }
        }
        Ok(serde_json::json!(false))
    }

    async fn scroll_by(&self, amount: i64) -> Result<()> {
        self.record(format!("scroll:{}", amount));
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<CookieEntry>> {
        Ok(self.live_cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[CookieEntry]) -> Result<()> {
        self.record(format!("set_cookies:{}", cookies.len()));
        Ok(())
    }

    async fn set_file_input(&self, selector: &str, path: &Path) -> Result<()> {
        self.record(format!("attach:{}:{}", selector, path.display()));
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        self.record("wait_nav".to_string());
        if let Some(ref url) = self.landing_after_nav {
            *self.current_url.lock().unwrap() = url.clone();
        }
        Ok(())
    }
}

/// Hands out scripted pages in order; the last one repeats so a scenario can
/// authenticate as often as it likes.
pub struct ScriptedFactory {
    pages: Mutex<VecDeque<Arc<ScriptedPage>>>,
    created: AtomicUsize,
}

impl ScriptedFactory {
    pub fn single(page: Arc<ScriptedPage>) -> Self {
        Self::queue(vec![page])
    }

    pub fn queue(pages: Vec<Arc<ScriptedPage>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextFactory for ScriptedFactory {
    async fn create(&self) -> Result<Arc<dyn PageDriver>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let mut pages = self.pages.lock().unwrap();
        let page = if pages.len() > 1 {
            pages.pop_front()
        } else {
            pages.front().cloned()
        };
        page.map(|p| p as Arc<dyn PageDriver>)
            .ok_or_else(|| PilotError::General("no scripted page queued".into()))
    }
}

/// Default config with all pacing zeroed and a temp session dir, so the
/// scenarios run at test speed.
pub fn test_config(session_dir: &Path) -> Config {
    let mut config = Config::default();
    config.session.base_dir = Some(session_dir.to_path_buf());
    config.pacing.click = PacingConfig::fixed(0);
    config.pacing.type_char = PacingConfig::fixed(0);
    config.pacing.scroll_step = PacingConfig::fixed(0);
    config.pacing.navigation = PacingConfig::fixed(0);
    config.discovery.settle_ms = 0;
    config.discovery.pass_delay_ms = 0;
    config
}

pub fn session_cookie(name: &str) -> CookieEntry {
    CookieEntry {
        name: name.to_string(),
        value: "opaque-token".to_string(),
        domain: ".tiktok.com".to_string(),
        path: "/".to_string(),
        expires: 1_900_000_000.0,
        http_only: true,
        secure: true,
    }
}
