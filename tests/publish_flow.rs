//! Publish workflow scenarios: checkpointed upload, description typing, and
//! the opt-in deadline on otherwise unbounded waits.

mod common;

use common::{ScriptedFactory, ScriptedPage, session_cookie, test_config};
use feedpilot::auth::{AuthState, Authenticator, Credentials};
use feedpilot::publish::{Audience, PublishRequest, Schedule};
use feedpilot::session::{SessionRecord, SessionStore};
use feedpilot::wait::WaitOptions;
use feedpilot::{PilotError, identity, publish};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn authenticated(
    temp: &TempDir,
    page: Arc<ScriptedPage>,
) -> Authenticator<ScriptedFactory> {
    let config = test_config(temp.path());
    let store = SessionStore::new(temp.path(), "cookies.json");
    store
        .save(
            &identity::storage_key("alice"),
            &SessionRecord::new(vec![session_cookie("sessionid")]),
        )
        .unwrap();

    let mut auth = Authenticator::new(ScriptedFactory::single(page), store, config);
    let state = auth
        .authenticate(&Credentials::new("alice", "pw"))
        .await
        .unwrap();
    assert_eq!(state, AuthState::Authenticated);
    auth
}

fn request() -> PublishRequest {
    PublishRequest {
        media_path: PathBuf::from("/videos/clip.mp4"),
        description: "hi".to_string(),
        audience: None,
        schedule: None,
    }
}

#[tokio::test]
async fn publish_requires_authentication() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let auth = Authenticator::new(
        ScriptedFactory::single(Arc::new(ScriptedPage::new())),
        SessionStore::new(temp.path(), "cookies.json"),
        config,
    );

    assert!(matches!(
        publish::publish(&auth, &request()).await,
        Err(PilotError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn publish_runs_checkpoints_in_order() {
    let temp = TempDir::new().unwrap();
    let page = Arc::new(
        ScriptedPage::new()
            .with_present("upload-complete")
            .with_present("publish-confirmation"),
    );
    let auth = authenticated(&temp, page.clone()).await;

    let outcome = publish::publish(&auth, &request()).await.unwrap();
    assert!(outcome.confirmed);
    assert_eq!(outcome.media, "/videos/clip.mp4");

    let events = page.events();
    let upload_nav = events
        .iter()
        .position(|e| e.starts_with("navigate:") && e.contains("/upload"))
        .expect("navigated to the upload surface");
    let attach = events
        .iter()
        .position(|e| e.starts_with("attach:") && e.contains("/videos/clip.mp4"))
        .expect("attached the media file");
    let described = events
        .iter()
        .position(|e| e == "insert:h")
        .expect("typed the description");
    let submitted = events
        .iter()
        .position(|e| e.starts_with("click:") && e.contains("publish-button"))
        .expect("clicked publish");

    assert!(upload_nav < attach);
    assert!(attach < described);
    assert!(described < submitted);
}

#[tokio::test]
async fn publish_with_schedule_and_audience_drives_extra_fields() {
    let temp = TempDir::new().unwrap();
    let page = Arc::new(
        ScriptedPage::new()
            .with_present("upload-complete")
            .with_present("publish-confirmation")
            .with_present("audience-select"),
    );
    let auth = authenticated(&temp, page.clone()).await;

    let mut req = request();
    req.audience = Some(Audience::Friends);
    req.schedule = Some(Schedule {
        date: "2026-09-01".to_string(),
        time: "18:30".to_string(),
    });

    publish::publish(&auth, &req).await.unwrap();

    let events = page.events();
    assert!(events.iter().any(|e| e.starts_with("click:") && e.contains("schedule-toggle")));
    let typed: String = events
        .iter()
        .filter_map(|e| e.strip_prefix("insert:"))
        .collect();
    assert!(typed.contains("2026-09-01"));
    assert!(typed.contains("18:30"));
}

#[tokio::test]
async fn publish_with_deadline_aborts_a_stalled_confirmation() {
    let temp = TempDir::new().unwrap();
    // Upload finishes but the confirmation modal never appears.
    let page = Arc::new(ScriptedPage::new().with_present("upload-complete"));
    let auth = authenticated(&temp, page).await;

    let result = publish::publish_with(
        &auth,
        &request(),
        WaitOptions::with_deadline(Duration::from_millis(100)),
    )
    .await;

    assert!(matches!(result, Err(PilotError::DeadlineExceeded(100))));
}
