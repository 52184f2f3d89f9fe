//! Loader for the static page fragment served on the dev server's HTTP side.
//!
//! The control channel's companion server also serves static fragments;
//! the widget can pull one in and display it in a viewer panel.

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Timeout for the fragment fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch the fragment at `url` and return its body text
pub async fn fetch(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    if !response.status().is_success() {
        bail!("{} returned {}", url, response.status());
    }

    response.text().await.context("Failed to read fragment body")
}

/// Display name for the viewer title: the last path segment of the URL,
/// or the whole URL when it has no path
pub fn display_name(url: &str) -> &str {
    url.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(url)
}
