use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Browser connection lost")]
    ConnectionLost,

    #[error("No active page; authenticate first to create a browser context")]
    NoActivePage,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationError(String),

    #[error("Invalid pacing range: min {min}ms exceeds max {max}ms")]
    InvalidPacing { min: u64, max: u64 },

    #[error("Corrupt session record: {0}")]
    CorruptSession(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Captcha service error: {0}")]
    CaptchaService(String),

    #[error("Wait cancelled")]
    Cancelled,

    #[error("Deadline exceeded after {0}ms")]
    DeadlineExceeded(u64),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("General error: {0}")]
    General(String),
}

impl PilotError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::LaunchFailed(_) => vec![
                "Ensure Chrome/Chromium is installed".into(),
                "Check if another browser instance is using the debugging port".into(),
                "Try specifying the executable with --chrome-path or [browser].chrome_path".into(),
            ],
            Self::ConnectionLost => vec![
                "Check if the browser window was closed manually".into(),
                "Re-run the command to start a fresh session".into(),
            ],
            Self::NoActivePage | Self::NotAuthenticated => vec![
                "Run the login command first".into(),
                "Check the final state of the last login attempt".into(),
            ],
            Self::ElementNotFound { selector } => vec![
                format!("Check if '{}' matches the current site markup", selector),
                "Site markup changes frequently; override the selector in the config file".into(),
            ],
            Self::CorruptSession(_) => vec![
                "Delete the identity's session directory and log in again".into(),
            ],
            Self::ConfigError(_) | Self::TomlDeError(_) | Self::TomlSerError(_) => vec![
                "Check configuration file syntax".into(),
                "Run with --verbose to see the resolved configuration".into(),
            ],
            Self::CaptchaService(_) => vec![
                "Verify the captcha API key".into(),
                "Solve the challenge manually in the browser window".into(),
            ],
            Self::DeadlineExceeded(_) => vec![
                "Increase or remove the --timeout to allow manual intervention".into(),
            ],
            _ => vec!["Run with --verbose for more details".into()],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LaunchFailed(_) | Self::ConnectionLost => 3,
            Self::NoActivePage | Self::NotAuthenticated => 4,
            Self::ElementNotFound { .. } => 5,
            Self::IoError(_) | Self::CorruptSession(_) => 6,
            Self::ConfigError(_) | Self::TomlDeError(_) | Self::TomlSerError(_) => 7,
            Self::Cancelled | Self::DeadlineExceeded(_) => 8,
            _ => 1,
        }
    }
}
