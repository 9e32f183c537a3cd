use crate::auth::{AuthState, Authenticator, ContextFactory};
use crate::config::PacingConfig;
use crate::{PilotError, Result};
use std::time::Duration;

/// Harvests reference links from a tag-scoped listing by scrolling lazy
/// content into existence and then walking the rendered list once.
///
/// Ordering follows document order at extraction time. Nothing is
/// deduplicated: running the same tag twice, or extracting while the listing
/// is still loading, can return duplicates or partial results. Callers that
/// need exact completeness validate on their side.
pub async fn search_tag(
    auth: &Authenticator<impl ContextFactory>,
    tag: &str,
) -> Result<Vec<String>> {
    if auth.state() != AuthState::Authenticated {
        return Err(PilotError::NotAuthenticated);
    }

    let gestures = auth.gestures()?;
    let config = auth.config();

    let listing_url = format!(
        "{}{}/{}",
        config.site.base_url.trim_end_matches('/'),
        config.site.tag_path,
        urlencoding::encode(tag)
    );

    tracing::info!(tag, url = %listing_url, "opening tag listing");
    gestures.page().navigate(&listing_url).await?;
    tokio::time::sleep(Duration::from_millis(config.discovery.settle_ms)).await;

    let outcome = gestures
        .scroll_page(
            config.discovery.scroll_step_px,
            &PacingConfig::fixed(config.discovery.pass_delay_ms),
            config.discovery.scroll_passes,
        )
        .await?;
    tracing::debug!(passes = outcome.passes, "scroll passes finished");

    let references = extract_references(auth, &config.selectors.listing_container).await?;
    tracing::info!(tag, found = references.len(), "tag listing extracted");
    Ok(references)
}

/// Walks the fixed listing shape: container → item children → each item's
/// last nested child → that child's anchor, keeping non-empty hrefs.
async fn extract_references(
    auth: &Authenticator<impl ContextFactory>,
    container_selector: &str,
) -> Result<Vec<String>> {
    let escaped = container_selector.replace('\\', "\\\\").replace('\'', "\\'");
    let script = format!(
        r#"(function() {{
            const refs = [];
            const container = document.querySelector('{}');
            if (!container) return refs;
            for (const item of container.children) {{
                const leaf = item.lastElementChild;
                if (!leaf) continue;
                const anchor = leaf.querySelector('a');
                if (anchor && anchor.href) refs.push(anchor.href);
            }}
            return refs;
        }})()"#,
        escaped
    );

    let value = auth.gestures()?.page().evaluate(&script).await?;
    let references: Vec<String> = serde_json::from_value(value).unwrap_or_default();
    Ok(references)
}
