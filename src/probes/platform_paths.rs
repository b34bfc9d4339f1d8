//! Existence checks against well-known platform program URLs

use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use super::{build_client, Probe};
use crate::config::ProbeConfig;
use crate::types::{ProgramRecord, Source};

/// HEAD-probes each platform URL template concurrently, each under its own deadline
pub struct PlatformPathProbe {
    client: reqwest::Client,
    templates: Vec<String>,
    timeout: Duration,
}

impl PlatformPathProbe {
    pub fn new(templates: Vec<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        Ok(Self {
            // Redirects are not followed so a 301/302 is observed as-is
            client: build_client(user_agent, timeout, false)?,
            templates,
            timeout,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Self::new(
            config.platform_templates.clone(),
            Duration::from_secs(config.platform_timeout_secs),
            &config.user_agent,
        )
    }

    pub fn candidate_urls(&self, domain: &str) -> Vec<String> {
        self.templates
            .iter()
            .map(|template| template.replace("{domain}", domain))
            .collect()
    }

    async fn check(&self, url: String) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.client.head(&url).send()).await {
            Ok(Ok(response)) if is_hit(response.status()) => {
                debug!("Platform hit: {} ({})", url, response.status());
                Some(url)
            }
            Ok(Ok(response)) => {
                debug!("Platform miss: {} ({})", url, response.status());
                None
            }
            Ok(Err(e)) => {
                debug!("Platform check {} failed: {}", url, e);
                None
            }
            Err(_) => {
                debug!("Platform check {} timed out", url);
                None
            }
        }
    }
}

/// Success and permanent/temporary redirects count as "program exists"
pub fn is_hit(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND
}

#[async_trait]
impl Probe for PlatformPathProbe {
    fn name(&self) -> &str {
        "platform paths"
    }

    async fn run(&self, domain: &str) -> Vec<ProgramRecord> {
        let checks = self
            .candidate_urls(domain)
            .into_iter()
            .map(|url| self.check(url));

        join_all(checks)
            .await
            .into_iter()
            .flatten()
            .map(|url| ProgramRecord::new(Source::Platform, url, domain))
            .collect()
    }
}
