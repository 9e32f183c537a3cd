use crate::config::{PacingConfig, PacingProfile};
use crate::page::PageDriver;
use crate::timeouts::ms;
use crate::{PilotError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one cooperative scroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Scroll steps actually issued.
    pub passes: u32,
    /// Last observed document height, when the page exposed one.
    pub final_height: Option<i64>,
}

/// Issues simulated user actions against one page, pausing after each so the
/// timing resembles human variance rather than machine-speed execution.
///
/// One engine is bound to one page for the page's whole lifetime; replacing
/// the page means building a new engine alongside it. Consumers receive the
/// engine by reference from the orchestrator, so a stale binding to a closed
/// page cannot be reached through the public API.
pub struct Gestures {
    page: Arc<dyn PageDriver>,
    profile: PacingProfile,
}

impl Gestures {
    pub fn new(page: Arc<dyn PageDriver>, profile: PacingProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { page, profile })
    }

    pub fn page(&self) -> &Arc<dyn PageDriver> {
        &self.page
    }

    async fn pause(&self, pacing: &PacingConfig) {
        tokio::time::sleep(Duration::from_millis(pacing.sample())).await;
    }

    /// Waits for the target to exist, clicks it, then idles for a drawn delay.
    pub async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .wait_for_element(selector, ms::ELEMENT_TIMEOUT)
            .await?;
        self.page.click(selector).await?;
        self.pause(&self.profile.click).await;
        Ok(())
    }

    /// Types one character at a time with an independently drawn pause
    /// between characters. Per-character pacing is deliberate: total
    /// duration grows with text length, which per-call pacing cannot mimic.
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.page
            .wait_for_element(selector, ms::ELEMENT_TIMEOUT)
            .await?;
        self.page.focus(selector).await?;

        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.page.insert_text(ch.encode_utf8(&mut buf)).await?;
            self.pause(&self.profile.type_char).await;
        }
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.page.navigate(url).await?;
        self.pause(&self.profile.navigation).await;
        Ok(())
    }

    /// Cooperative scroll loop: issue one step, settle for a delay drawn
    /// from `pacing`, then check the termination predicate (pass budget
    /// exhausted, or the document height stopped growing between passes).
    ///
    /// Returning does not mean lazy content finished loading; callers must
    /// separately await whatever load signal they extract against.
    pub async fn scroll_page(
        &self,
        amount: i64,
        pacing: &PacingConfig,
        max_passes: u32,
    ) -> Result<ScrollOutcome> {
        pacing.validate()?;
        if amount <= 0 {
            return Err(PilotError::General(format!(
                "scroll amount must be positive, got {}",
                amount
            )));
        }

        let mut last_height: Option<i64> = None;
        let mut passes = 0u32;

        while passes < max_passes {
            self.page.scroll_by(amount).await?;
            passes += 1;
            self.pause(pacing).await;

            // A page that exposes no height reading never terminates early.
            let height = self.document_height().await;
            if let (Some(current), Some(previous)) = (height, last_height)
                && current == previous
            {
                tracing::debug!(passes, height = current, "document stopped growing");
                break;
            }
            if height.is_some() {
                last_height = height;
            }
        }

        Ok(ScrollOutcome {
            passes,
            final_height: last_height,
        })
    }

    async fn document_height(&self) -> Option<i64> {
        self.page
            .evaluate("document.body ? document.body.scrollHeight : 0")
            .await
            .ok()
            .and_then(|v| v.as_i64())
    }
}
