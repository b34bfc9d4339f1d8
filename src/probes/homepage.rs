//! Homepage scanning for platform links and disclosure keywords

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{build_client, fetch_text, Probe};
use crate::config::ProbeConfig;
use crate::types::{ProgramRecord, Source};

/// Substrings that mark a link as pointing at a bug bounty platform
pub const PLATFORM_NAMES: &[&str] = &["hackerone", "bugcrowd", "intigriti", "yeswehack"];

/// Phrases that suggest the site runs a disclosure program
pub const DISCLOSURE_KEYWORDS: &[&str] = &["bug bounty", "responsible disclosure", "vulnerability"];

lazy_static! {
    static ref HREF: Regex = Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Fetches the domain's homepage and scans it
pub struct HomepageProbe {
    client: reqwest::Client,
    scheme: String,
    timeout: Duration,
    http_fallback: bool,
}

impl HomepageProbe {
    pub fn new(scheme: &str, timeout: Duration, http_fallback: bool, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent, timeout, true)?,
            scheme: scheme.to_string(),
            timeout,
            http_fallback,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Self::new(
            &config.scheme,
            Duration::from_secs(config.homepage_timeout_secs),
            config.homepage_http_fallback,
            &config.user_agent,
        )
    }

    /// Returns the page body and the scheme it was served over
    async fn fetch(&self, domain: &str) -> Option<(String, String)> {
        let mut schemes = vec![self.scheme.clone()];
        if self.http_fallback && self.scheme != "http" {
            schemes.push("http".to_string());
        }

        for scheme in schemes {
            let url = format!("{}://{}/", scheme, domain);
            if let Some(body) = fetch_text(&self.client, &url, self.timeout).await {
                return Some((body, scheme));
            }
        }
        None
    }
}

/// Scan homepage markup served from `{scheme}://{domain}/`
pub fn scan_homepage(html: &str, scheme: &str, domain: &str) -> Vec<ProgramRecord> {
    let origin = format!("{}://{}", scheme, domain);
    let mut records = Vec::new();

    if let Ok(base) = Url::parse(&format!("{}/", origin)) {
        for capture in HREF.captures_iter(html) {
            let href = capture[1].trim();
            let lower = href.to_lowercase();

            if !PLATFORM_NAMES.iter().any(|name| lower.contains(name)) {
                continue;
            }

            match base.join(href) {
                Ok(link) => records.push(ProgramRecord::new(Source::Platform, link.as_str(), domain)),
                Err(e) => debug!("Skipping unresolvable link {}: {}", href, e),
            }
        }
    }

    let text = TAG.replace_all(html, " ").to_lowercase();
    if DISCLOSURE_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        records.push(ProgramRecord::new(Source::Website, origin, domain));
    }

    records
}

#[async_trait]
impl Probe for HomepageProbe {
    fn name(&self) -> &str {
        "homepage"
    }

    async fn run(&self, domain: &str) -> Vec<ProgramRecord> {
        match self.fetch(domain).await {
            Some((html, scheme)) => scan_homepage(&html, &scheme, domain),
            None => Vec::new(),
        }
    }
}
