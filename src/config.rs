use crate::{PilotError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub pacing: PacingProfile,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// Path segment whose presence in a URL marks it as the login surface.
    /// The sole success signal after a submit is this segment disappearing.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_tag_path")]
    pub tag_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Defaults to `<config dir>/sessions` when unset.
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_cookies_file")]
    pub cookies_file: String,
}

impl SessionConfig {
    pub fn resolve_base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_config_dir().map(|d| d.join("sessions")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    pub chrome_path: Option<PathBuf>,
    /// Headed by default so a human can step in on CAPTCHA/2FA challenges.
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user_data_dir: Option<PathBuf>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Millisecond delay range for one class of simulated action. The actual
/// pause is drawn uniformly from the closed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PacingConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl PacingConfig {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_ms > self.max_ms {
            return Err(PilotError::InvalidPacing {
                min: self.min_ms,
                max: self.max_ms,
            });
        }
        Ok(())
    }

    /// Draws a delay uniformly from `[min_ms, max_ms]`.
    pub fn sample(&self) -> u64 {
        use rand::Rng;
        if self.min_ms >= self.max_ms {
            return self.min_ms;
        }
        rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PacingProfile {
    #[serde(default = "default_click_pacing")]
    pub click: PacingConfig,
    /// Applied between individual characters, not per call; total typing
    /// duration grows with text length the way human typing does.
    #[serde(default = "default_type_char_pacing")]
    pub type_char: PacingConfig,
    #[serde(default = "default_scroll_step_pacing")]
    pub scroll_step: PacingConfig,
    #[serde(default = "default_navigation_pacing")]
    pub navigation: PacingConfig,
}

impl PacingProfile {
    pub fn validate(&self) -> Result<()> {
        self.click.validate()?;
        self.type_char.validate()?;
        self.scroll_step.validate()?;
        self.navigation.validate()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Settling interval after navigating to a tag listing.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: u32,
    /// Fixed delay between scroll passes while lazy content materializes.
    #[serde(default = "default_pass_delay_ms")]
    pub pass_delay_ms: u64,
    #[serde(default = "default_scroll_step_px")]
    pub scroll_step_px: i64,
}

/// Site-coupled markup hooks. These are overridable constants, not part of
/// the core design; expect to adjust them whenever the target site ships.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    #[serde(default = "default_username_field")]
    pub username_field: String,
    #[serde(default = "default_password_field")]
    pub password_field: String,
    #[serde(default = "default_login_submit")]
    pub login_submit: String,
    #[serde(default = "default_listing_container")]
    pub listing_container: String,
    #[serde(default = "default_file_input")]
    pub file_input: String,
    #[serde(default = "default_upload_done")]
    pub upload_done: String,
    #[serde(default = "default_description_field")]
    pub description_field: String,
    #[serde(default = "default_audience_select")]
    pub audience_select: String,
    #[serde(default = "default_schedule_toggle")]
    pub schedule_toggle: String,
    #[serde(default = "default_schedule_date")]
    pub schedule_date: String,
    #[serde(default = "default_schedule_time")]
    pub schedule_time: String,
    #[serde(default = "default_publish_button")]
    pub publish_button: String,
    #[serde(default = "default_confirm_modal")]
    pub confirm_modal: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_captcha_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_captcha_initial_wait")]
    pub initial_wait_secs: u64,
    #[serde(default = "default_captcha_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_captcha_max_polls")]
    pub max_polls: u32,
}

fn default_base_url() -> String {
    "https://www.tiktok.com".to_string()
}
fn default_login_url() -> String {
    "https://www.tiktok.com/login".to_string()
}
fn default_upload_url() -> String {
    "https://www.tiktok.com/upload".to_string()
}
fn default_login_path() -> String {
    "/login".to_string()
}
fn default_tag_path() -> String {
    "/tag".to_string()
}
fn default_cookies_file() -> String {
    "cookies.json".to_string()
}
fn default_port() -> u16 {
    9222
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    800
}
fn default_click_pacing() -> PacingConfig {
    PacingConfig::new(400, 1200)
}
fn default_type_char_pacing() -> PacingConfig {
    PacingConfig::new(40, 140)
}
fn default_scroll_step_pacing() -> PacingConfig {
    PacingConfig::new(400, 900)
}
fn default_navigation_pacing() -> PacingConfig {
    PacingConfig::new(1000, 2500)
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_scroll_passes() -> u32 {
    10
}
fn default_pass_delay_ms() -> u64 {
    1000
}
fn default_scroll_step_px() -> i64 {
    800
}
fn default_username_field() -> String {
    "input[name='username']".to_string()
}
fn default_password_field() -> String {
    "input[type='password']".to_string()
}
fn default_login_submit() -> String {
    "button[type='submit']".to_string()
}
fn default_listing_container() -> String {
    "[data-e2e='challenge-item-list']".to_string()
}
fn default_file_input() -> String {
    "input[type='file']".to_string()
}
fn default_upload_done() -> String {
    "[data-e2e='upload-complete']".to_string()
}
fn default_description_field() -> String {
    "[data-e2e='caption-editor'] [contenteditable='true']".to_string()
}
fn default_audience_select() -> String {
    "select[data-e2e='audience-select']".to_string()
}
fn default_schedule_toggle() -> String {
    "[data-e2e='schedule-toggle']".to_string()
}
fn default_schedule_date() -> String {
    "input[data-e2e='schedule-date']".to_string()
}
fn default_schedule_time() -> String {
    "input[data-e2e='schedule-time']".to_string()
}
fn default_publish_button() -> String {
    "[data-e2e='publish-button']".to_string()
}
fn default_confirm_modal() -> String {
    "[data-e2e='publish-confirmation']".to_string()
}
fn default_captcha_endpoint() -> String {
    "https://2captcha.com".to_string()
}
fn default_captcha_initial_wait() -> u64 {
    15
}
fn default_captcha_poll_interval() -> u64 {
    5
}
fn default_captcha_max_polls() -> u32 {
    24
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_url: default_login_url(),
            upload_url: default_upload_url(),
            login_path: default_login_path(),
            tag_path: default_tag_path(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            cookies_file: default_cookies_file(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: false,
            port: default_port(),
            user_data_dir: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for PacingProfile {
    fn default() -> Self {
        Self {
            click: default_click_pacing(),
            type_char: default_type_char_pacing(),
            scroll_step: default_scroll_step_pacing(),
            navigation: default_navigation_pacing(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            scroll_passes: default_scroll_passes(),
            pass_delay_ms: default_pass_delay_ms(),
            scroll_step_px: default_scroll_step_px(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            username_field: default_username_field(),
            password_field: default_password_field(),
            login_submit: default_login_submit(),
            listing_container: default_listing_container(),
            file_input: default_file_input(),
            upload_done: default_upload_done(),
            description_field: default_description_field(),
            audience_select: default_audience_select(),
            schedule_toggle: default_schedule_toggle(),
            schedule_date: default_schedule_date(),
            schedule_time: default_schedule_time(),
            publish_button: default_publish_button(),
            confirm_modal: default_confirm_modal(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_captcha_endpoint(),
            initial_wait_secs: default_captcha_initial_wait(),
            poll_interval_secs: default_captcha_poll_interval(),
            max_polls: default_captcha_max_polls(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    default_config_dir().map(|p| p.join("config.toml"))
}

pub fn default_config_dir() -> Result<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .map(|p| p.join("feedpilot"))
        .ok_or_else(|| PilotError::ConfigError("Could not determine config directory".into()))
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let global_path = default_config_path()?;
        if global_path.exists() {
            let content = std::fs::read_to_string(&global_path)?;
            config = toml::from_str(&content)?;
        }

        let project_path = PathBuf::from(".feedpilot.toml");
        if project_path.exists() {
            let content = std::fs::read_to_string(&project_path)?;
            let project_config: Config = toml::from_str(&content)?;
            config = config.merge(project_config);
        }

        config.load_from_env();

        Ok(config)
    }

    pub fn load_with_overrides(&self, cli_overrides: ConfigOverrides) -> Self {
        let mut config = self.clone();

        if let Some(headless) = cli_overrides.headless {
            config.browser.headless = headless;
        }
        if let Some(chrome_path) = cli_overrides.chrome_path {
            config.browser.chrome_path = Some(chrome_path);
        }
        if let Some(session_dir) = cli_overrides.session_dir {
            config.session.base_dir = Some(session_dir);
        }

        config
    }

    fn merge(mut self, other: Config) -> Self {
        if other.browser.chrome_path.is_some() {
            self.browser.chrome_path = other.browser.chrome_path;
        }
        if other.browser.user_data_dir.is_some() {
            self.browser.user_data_dir = other.browser.user_data_dir;
        }
        if other.session.base_dir.is_some() {
            self.session.base_dir = other.session.base_dir;
        }
        if other.captcha.api_key.is_some() {
            self.captcha.api_key = other.captcha.api_key;
        }
        self
    }

    fn load_from_env(&mut self) {
        if let Ok(url) = std::env::var("FEEDPILOT_BASE_URL") {
            self.site.base_url = url;
        }
        if let Ok(headless) = std::env::var("FEEDPILOT_HEADLESS") {
            self.browser.headless = headless == "true" || headless == "1";
        }
        if let Ok(dir) = std::env::var("FEEDPILOT_SESSION_DIR") {
            self.session.base_dir = Some(PathBuf::from(dir));
        }
        if let Ok(key) = std::env::var("FEEDPILOT_CAPTCHA_KEY") {
            self.captcha.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("site.base_url", &self.site.base_url),
            ("site.login_url", &self.site.login_url),
            ("site.upload_url", &self.site.upload_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| PilotError::ConfigError(format!("{} is not a valid URL: {}", name, e)))?;
        }

        self.pacing.validate()?;

        if self.discovery.scroll_passes == 0 {
            return Err(PilotError::ConfigError(
                "discovery.scroll_passes must be greater than 0".into(),
            ));
        }
        if self.discovery.scroll_step_px <= 0 {
            return Err(PilotError::ConfigError(
                "discovery.scroll_step_px must be positive".into(),
            ));
        }
        if self.session.cookies_file.is_empty() || self.session.cookies_file.contains('/') {
            return Err(PilotError::ConfigError(
                "session.cookies_file must be a bare file name".into(),
            ));
        }

        if let Some(ref path) = self.browser.chrome_path
            && !path.exists()
        {
            return Err(PilotError::ConfigError(format!(
                "Chrome path does not exist: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn show_masked(&self) -> String {
        format!(
            r#"Site:
  Base URL: {}
  Login URL: {}
  Upload URL: {}

Session:
  Base Dir: {}
  Cookies File: {}

Browser:
  Chrome Path: {}
  Headless: {}

Pacing (ms):
  Click: {}-{}
  Type (per char): {}-{}
  Scroll Step: {}-{}
  Navigation: {}-{}

Discovery:
  Scroll Passes: {}
  Pass Delay: {}ms

Captcha:
  API Key: {}
"#,
            self.site.base_url,
            self.site.login_url,
            self.site.upload_url,
            self.session
                .base_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default".into()),
            self.session.cookies_file,
            self.browser
                .chrome_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto-detect".into()),
            self.browser.headless,
            self.pacing.click.min_ms,
            self.pacing.click.max_ms,
            self.pacing.type_char.min_ms,
            self.pacing.type_char.max_ms,
            self.pacing.scroll_step.min_ms,
            self.pacing.scroll_step.max_ms,
            self.pacing.navigation.min_ms,
            self.pacing.navigation.max_ms,
            self.discovery.scroll_passes,
            self.discovery.pass_delay_ms,
            if self.captcha.api_key.is_some() {
                "configured"
            } else {
                "not set"
            },
        )
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub headless: Option<bool>,
    pub chrome_path: Option<PathBuf>,
    pub session_dir: Option<PathBuf>,
}
