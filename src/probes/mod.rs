//! Independent best-effort probes that each contribute zero or more program records
//!
//! A probe never fails: network errors, timeouts and non-success statuses all
//! collapse to "no signal" (an empty list).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;

use crate::types::ProgramRecord;

pub mod homepage;
pub mod manual;
pub mod platform_paths;
pub mod security_txt;

pub use homepage::HomepageProbe;
pub use manual::ManualProbe;
pub use platform_paths::PlatformPathProbe;
pub use security_txt::SecurityTxtProbe;

/// A single discovery probe
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe name used in logs
    fn name(&self) -> &str;

    /// Run the probe for a normalized domain
    async fn run(&self, domain: &str) -> Vec<ProgramRecord>;
}

/// Build the HTTP client shared by a probe
pub(crate) fn build_client(user_agent: &str, timeout: Duration, follow_redirects: bool) -> Result<reqwest::Client> {
    let policy = if follow_redirects {
        Policy::limited(5)
    } else {
        Policy::none()
    };

    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .redirect(policy)
        .gzip(true)
        .build()
        .context("Failed to build HTTP client")
}

/// GET a URL and return its body if the status is a success.
/// The whole exchange, body included, runs under `deadline`.
pub(crate) async fn fetch_text(client: &reqwest::Client, url: &str, deadline: Duration) -> Option<String> {
    let request = async {
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            debug!("{} returned {}", url, response.status());
            return Ok::<_, reqwest::Error>(None);
        }
        response.text().await.map(Some)
    };

    match tokio::time::timeout(deadline, request).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            debug!("Request to {} failed: {}", url, e);
            None
        }
        Err(_) => {
            debug!("Request to {} timed out after {:?}", url, deadline);
            None
        }
    }
}
