use crate::auth::{AuthState, Authenticator, ContextFactory};
use crate::output::{self, OutputFormatter};
use crate::page::PageDriver;
use crate::timeouts::ms;
use crate::wait::{self, WaitOptions};
use crate::{PilotError, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Friends,
    Private,
}

impl Audience {
    fn option_value(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::Private => "private",
        }
    }
}

impl std::str::FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "friends" => Ok(Self::Friends),
            "private" => Ok(Self::Private),
            _ => Err(format!("Invalid audience: {}", s)),
        }
    }
}

/// Site-local date and time strings, typed into the schedule fields as-is.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub media_path: PathBuf,
    pub description: String,
    pub audience: Option<Audience>,
    pub schedule: Option<Schedule>,
}

#[derive(Debug, Serialize)]
pub struct PublishOutcome {
    pub media: String,
    pub confirmed: bool,
}

impl OutputFormatter for PublishOutcome {
    fn format_text(&self) -> String {
        use crate::output::text;
        format!(
            "{}\n{}",
            text::success("Publish confirmed"),
            text::key_value("Media", &self.media)
        )
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

/// Runs the scripted publish workflow: attach the payload, wait for the
/// upload to finish, describe it, optionally pick audience and schedule,
/// submit, and wait for the confirming modal.
///
/// Every checkpoint is a strict step with no branching recovery. The upload
/// and confirmation waits have no deadline; a stalled site surface is
/// visible as a hung call, exactly like the login flow's tolerance for
/// manual intervention. Use `publish_with` to opt into bounds.
pub async fn publish(
    auth: &Authenticator<impl ContextFactory>,
    request: &PublishRequest,
) -> Result<PublishOutcome> {
    if auth.state() != AuthState::Authenticated {
        return Err(PilotError::NotAuthenticated);
    }

    let gestures = auth.gestures()?;
    let config = auth.config();
    let selectors = &config.selectors;
    let page = gestures.page();

    tracing::info!(media = %request.media_path.display(), "starting publish workflow");
    gestures.navigate(&config.site.upload_url).await?;

    page.wait_for_element(&selectors.file_input, ms::ELEMENT_TIMEOUT)
        .await?;
    page.set_file_input(&selectors.file_input, &request.media_path)
        .await?;

    tracing::debug!("waiting for upload to complete");
    wait_until_present(page, &selectors.upload_done).await?;

    gestures
        .type_text(&selectors.description_field, &request.description)
        .await?;

    if let Some(audience) = request.audience {
        select_audience(auth, audience).await?;
    }

    if let Some(ref schedule) = request.schedule {
        gestures.click(&selectors.schedule_toggle).await?;
        gestures
            .type_text(&selectors.schedule_date, &schedule.date)
            .await?;
        gestures
            .type_text(&selectors.schedule_time, &schedule.time)
            .await?;
    }

    gestures.click(&selectors.publish_button).await?;

    tracing::debug!("waiting for confirmation modal");
    wait_until_present(page, &selectors.confirm_modal).await?;

    tracing::info!("publish confirmed");
    Ok(PublishOutcome {
        media: request.media_path.display().to_string(),
        confirmed: true,
    })
}

/// `publish` bounded by the caller's deadline or cancel signal.
pub async fn publish_with(
    auth: &Authenticator<impl ContextFactory>,
    request: &PublishRequest,
    opts: WaitOptions,
) -> Result<PublishOutcome> {
    wait::with_options(opts, publish(auth, request)).await
}

/// Polls for the selector with no deadline. Progress indicators and
/// confirmation modals appear whenever the site decides they do.
async fn wait_until_present(page: &std::sync::Arc<dyn PageDriver>, selector: &str) -> Result<()> {
    let escaped = selector.replace('\\', "\\\\").replace('\'', "\\'");
    let probe = format!("!!document.querySelector('{}')", escaped);

    loop {
        let present = page
            .evaluate(&probe)
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if present {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(ms::PROGRESS_POLL)).await;
    }
}

/// Drives a native `<select>` the way a page script would: set the value,
/// then fire a change event so the page's listeners run.
async fn select_audience(
    auth: &Authenticator<impl ContextFactory>,
    audience: Audience,
) -> Result<()> {
    let config = auth.config();
    let escaped = config
        .selectors
        .audience_select
        .replace('\\', "\\\\")
        .replace('\'', "\\'");
    let script = format!(
        r#"(function() {{
            const el = document.querySelector('{}');
            if (!el) return false;
            el.value = '{}';
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        escaped,
        audience.option_value()
    );

    let selected = auth
        .gestures()?
        .page()
        .evaluate(&script)
        .await?
        .as_bool()
        .unwrap_or(false);

    if !selected {
        return Err(PilotError::ElementNotFound {
            selector: config.selectors.audience_select.clone(),
        });
    }
    Ok(())
}
