use crate::config::Config;
use crate::gesture::Gestures;
use crate::identity;
use crate::page::PageDriver;
use crate::session::{SessionRecord, SessionStore};
use crate::wait::{self, WaitOptions};
use crate::{PilotError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Authentication progress for one client session. A failed login resolves
/// to `Failed` rather than an error: manual intervention in the open browser
/// window may still succeed a moment later, so callers poll `state()` or the
/// page URL instead of catching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    SessionRestoring,
    LoggingIn,
    Authenticated,
    Failed,
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SessionRestoring => "session_restoring",
            Self::LoggingIn => "logging_in",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

/// Creates a fresh browser context and hands back its live page. The
/// authenticator drops its previous page before calling this, so factories
/// never see two contexts alive at once.
#[async_trait]
pub trait ContextFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn PageDriver>>;
}

#[async_trait]
impl<T: ContextFactory + ?Sized> ContextFactory for Arc<T> {
    async fn create(&self) -> Result<Arc<dyn PageDriver>> {
        self.as_ref().create().await
    }
}

/// Composes the identity hasher, session store, and gesture engine into the
/// login state machine: restore a cached session when it looks usable,
/// otherwise run a paced credential login and persist the resulting cookies.
pub struct Authenticator<F: ContextFactory> {
    factory: F,
    store: SessionStore,
    config: Config,
    state: AuthState,
    gestures: Option<Arc<Gestures>>,
}

impl<F: ContextFactory> Authenticator<F> {
    pub fn new(factory: F, store: SessionStore, config: Config) -> Self {
        Self {
            factory,
            store,
            config,
            state: AuthState::Unauthenticated,
            gestures: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The engine bound to the current page. Errors before any context
    /// exists, never hands out a binding to a torn-down page.
    pub fn gestures(&self) -> Result<&Arc<Gestures>> {
        self.gestures.as_ref().ok_or(PilotError::NoActivePage)
    }

    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<AuthState> {
        // One context per orchestrator: drop whatever is live before
        // building the replacement, even when re-authenticating the same
        // identity.
        self.gestures = None;
        self.state = AuthState::Unauthenticated;

        let page = self.factory.create().await?;
        let gestures = Arc::new(Gestures::new(page.clone(), self.config.pacing.clone())?);

        self.state = AuthState::SessionRestoring;
        tracing::info!(identity = %credentials.identity, "restoring session");
        gestures.navigate(&self.config.site.base_url).await?;

        let storage_key = identity::storage_key(&credentials.identity);
        let record = self.store.load(&storage_key)?;
        if let Some(ref record) = record {
            tracing::debug!(cookies = record.len(), "injecting cached cookies");
            page.set_cookies(&record.cookies).await?;
        }

        let current_url = page.current_url().await?;
        let has_cached_cookies = record.as_ref().is_some_and(|r| !r.is_empty());

        if has_cached_cookies && !self.is_login_url(&current_url) {
            // Cached-session short-circuit: no credential submission at all.
            self.state = AuthState::Authenticated;
            self.gestures = Some(gestures);
            tracing::info!(url = %current_url, "cached session accepted");
            return Ok(self.state);
        }

        self.state = AuthState::LoggingIn;
        tracing::info!("no usable cached session, submitting credentials");
        gestures.navigate(&self.config.site.login_url).await?;
        gestures
            .type_text(&self.config.selectors.username_field, &credentials.identity)
            .await?;
        gestures
            .type_text(&self.config.selectors.password_field, &credentials.secret)
            .await?;
        gestures.click(&self.config.selectors.login_submit).await?;

        // No deadline: a CAPTCHA or 2FA prompt may sit here until a human
        // resolves it in the browser window.
        page.wait_for_navigation().await?;

        let landed_url = page.current_url().await?;
        if self.is_login_url(&landed_url) {
            self.state = AuthState::Failed;
            tracing::warn!(url = %landed_url, "login not accepted");
        } else {
            let cookies = page.cookies().await?;
            self.store
                .save(&storage_key, &SessionRecord::new(cookies))?;
            self.state = AuthState::Authenticated;
            tracing::info!(url = %landed_url, "login accepted, session persisted");
        }

        self.gestures = Some(gestures);
        Ok(self.state)
    }

    /// `authenticate` bounded by the caller's deadline or cancel signal.
    /// The default contract stays unbounded; this is the opt-in boundary.
    pub async fn authenticate_with(
        &mut self,
        credentials: &Credentials,
        opts: WaitOptions,
    ) -> Result<AuthState> {
        wait::with_options(opts, self.authenticate(credentials)).await
    }

    /// The sole success signal is URL substring matching against the login
    /// path segment. Coarse on redirects, but it is the contract.
    fn is_login_url(&self, url: &str) -> bool {
        url.contains(&self.config.site.login_path)
    }
}
