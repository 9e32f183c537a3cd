pub mod auth;
pub mod browser;
pub mod captcha;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod gesture;
pub mod identity;
pub mod output;
pub mod page;
pub mod publish;
pub mod session;
pub mod timeouts;
pub mod wait;

pub use auth::{AuthState, Authenticator, ContextFactory, Credentials};
pub use config::Config;
pub use error::PilotError;
pub use page::PageDriver;

pub type Result<T> = std::result::Result<T, PilotError>;
