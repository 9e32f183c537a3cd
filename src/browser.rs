use crate::auth::ContextFactory;
use crate::config::Config;
use crate::page::PageDriver;
use crate::session::CookieEntry;
use crate::timeouts::{ms, secs};
use crate::{PilotError, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::network::{
    GetCookiesParams, SetCookieParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One live browser, one navigable page, exclusively owned by whoever holds
/// the context. Dropping the context closes the CDP connection and with it
/// the launched browser, so at most one is alive per orchestrator.
pub struct BrowserContext {
    _browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserContext {
    pub async fn launch(config: &Config) -> Result<Self> {
        let chrome_path = config
            .browser
            .chrome_path
            .clone()
            .map(Ok)
            .unwrap_or_else(find_chrome_executable)?;

        let mut builder = chromiumoxide::BrowserConfig::builder()
            .chrome_executable(&chrome_path)
            .port(config.browser.port)
            .window_size(config.browser.window_width, config.browser.window_height)
            .request_timeout(Duration::from_secs(secs::CDP_REQUEST));

        if !config.browser.headless {
            builder = builder.with_head();
        }
        if let Some(ref dir) = config.browser.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        let browser_config = builder
            .build()
            .map_err(PilotError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| PilotError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PilotError::LaunchFailed(e.to_string()))?;

        tracing::info!(
            path = %chrome_path.display(),
            headless = config.browser.headless,
            "browser launched"
        );

        Ok(Self {
            _browser: browser,
            page,
            handler_task,
        })
    }

    /// Polls `document.readyState` until it reads complete twice in a row,
    /// bounded so an unresponsive tab cannot wedge plain navigations.
    async fn wait_for_ready_state(&self) -> Result<()> {
        let timeout = Duration::from_secs(secs::NAVIGATION);
        tokio::time::timeout(timeout, async {
            let mut stable_count = 0;
            loop {
                match tokio::time::timeout(
                    Duration::from_secs(secs::READY_STATE),
                    self.page.evaluate("document.readyState"),
                )
                .await
                {
                    Ok(Ok(result)) => {
                        if result.into_value::<String>().is_ok_and(|s| s == "complete") {
                            stable_count += 1;
                            if stable_count >= 2 {
                                return;
                            }
                        } else {
                            stable_count = 0;
                        }
                    }
                    Ok(Err(_)) | Err(_) => {
                        stable_count = 0;
                    }
                }
                tokio::time::sleep(Duration::from_millis(ms::READY_STATE_SETTLE)).await;
            }
        })
        .await
        .map_err(|_| PilotError::NavigationFailed("page never reached readyState complete".into()))
    }
}

impl Drop for BrowserContext {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl PageDriver for BrowserContext {
    async fn navigate(&self, url: &str) -> Result<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(PilotError::NavigationFailed)?;

        self.page
            .execute(params)
            .await
            .map_err(|e| PilotError::NavigationFailed(e.to_string()))?;

        self.wait_for_ready_state().await?;
        tokio::time::sleep(Duration::from_millis(ms::PAGE_SETTLE)).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|_| PilotError::ConnectionLost)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn wait_for_element(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(PilotError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PilotError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        element
            .click()
            .await
            .map_err(|e| PilotError::General(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        // Clicking is how a user focuses a field; it also dismisses overlays
        // that programmatic focus would leave in place.
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PilotError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        element
            .click()
            .await
            .map_err(|e| PilotError::General(format!("Focus failed: {}", e)))?;
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> Result<()> {
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(|e| PilotError::General(format!("Failed to insert text: {}", e)))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PilotError::EvaluationError(e.to_string()))?;

        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn scroll_by(&self, amount: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", amount))
            .await
            .map_err(|e| PilotError::EvaluationError(e.to_string()))?;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<CookieEntry>> {
        let response = self
            .page
            .execute(GetCookiesParams::default())
            .await
            .map_err(|e| PilotError::General(format!("Failed to get cookies: {}", e)))?;

        Ok(response
            .cookies
            .clone()
            .into_iter()
            .map(|c| CookieEntry {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                expires: c.expires,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: &[CookieEntry]) -> Result<()> {
        for cookie in cookies {
            let mut params = SetCookieParams::builder()
                .name(&cookie.name)
                .value(&cookie.value)
                .domain(&cookie.domain)
                .path(&cookie.path)
                .secure(cookie.secure)
                .http_only(cookie.http_only);

            if cookie.expires > 0.0 {
                params = params.expires(TimeSinceEpoch::new(cookie.expires));
            }

            let params = params
                .build()
                .map_err(|e| PilotError::General(format!("Invalid cookie: {}", e)))?;

            self.page
                .execute(params)
                .await
                .map_err(|e| PilotError::General(format!("Failed to set cookie: {}", e)))?;
        }
        Ok(())
    }

    async fn set_file_input(&self, selector: &str, path: &Path) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PilotError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        let params = SetFileInputFilesParams::builder()
            .file(path.display().to_string())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(|e| PilotError::General(format!("Invalid file input params: {}", e)))?;

        self.page
            .execute(params)
            .await
            .map_err(|e| PilotError::General(format!("Failed to attach file: {}", e)))?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| PilotError::NavigationFailed(e.to_string()))?;
        Ok(())
    }
}

/// Builds one fresh `BrowserContext` per call; the authenticator drops the
/// previous one before asking for the next.
pub struct ChromiumFactory {
    config: Config,
}

impl ChromiumFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ContextFactory for ChromiumFactory {
    async fn create(&self) -> Result<Arc<dyn PageDriver>> {
        let context = BrowserContext::launch(&self.config).await?;
        Ok(Arc::new(context))
    }
}

pub fn find_chrome_executable() -> Result<PathBuf> {
    if let Some(path) = find_in_standard_locations() {
        return Ok(path);
    }

    if let Some(path) = find_in_path() {
        return Ok(path);
    }

    Err(PilotError::LaunchFailed(
        "Could not find Chrome/Chromium executable. Specify one with [browser].chrome_path".into(),
    ))
}

#[cfg(target_os = "macos")]
fn find_in_standard_locations() -> Option<PathBuf> {
    let paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
    ];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(target_os = "linux")]
fn find_in_standard_locations() -> Option<PathBuf> {
    let paths = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(target_os = "windows")]
fn find_in_standard_locations() -> Option<PathBuf> {
    let paths = [
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files\Chromium\Application\chrome.exe",
    ];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn find_in_standard_locations() -> Option<PathBuf> {
    None
}

fn find_in_path() -> Option<PathBuf> {
    let binaries = if cfg!(windows) {
        vec!["chrome.exe", "chromium.exe"]
    } else {
        vec!["google-chrome", "chromium", "chromium-browser", "chrome"]
    };

    binaries.into_iter().find_map(|b| which::which(b).ok())
}
