//! Authoritative bug bounty platform API integrations
//!
//! When API keys are unlocked, these are consulted before the heuristic probes.
//! Any hit here is returned on its own and never merged with probe results.

use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::PlatformsConfig;
use crate::credentials::Credentials;
use crate::types::ProgramRecord;

pub mod bugcrowd;
pub mod hackerone;

pub use bugcrowd::BugcrowdAPI;
pub use hackerone::HackerOneAPI;

/// Platform API trait for looking up a domain's programs
#[async_trait]
pub trait PlatformAPI: Send + Sync {
    /// Get the platform name (e.g., "HackerOne", "Bugcrowd")
    fn name(&self) -> &str;

    /// Programs on this platform that cover the domain
    async fn find_programs(&self, domain: &str) -> Result<Vec<ProgramRecord>>;

    /// Check if API credentials are valid
    async fn test_connection(&self) -> Result<bool>;
}

/// Build a client for every platform the credentials cover
pub fn clients_for(credentials: &Credentials, config: &PlatformsConfig) -> Result<Vec<Box<dyn PlatformAPI>>> {
    let timeout = Duration::from_secs(config.api_timeout_secs);
    let mut platforms: Vec<Box<dyn PlatformAPI>> = Vec::new();

    if let Some((username, token)) = credentials.hackerone() {
        platforms.push(Box::new(
            HackerOneAPI::new(username.to_string(), token.to_string(), timeout)?
                .with_base_url(&config.hackerone_api_url),
        ));
    }

    if let Some(token) = credentials.bugcrowd() {
        platforms.push(Box::new(
            BugcrowdAPI::new(token.to_string(), timeout)?.with_base_url(&config.bugcrowd_api_url),
        ));
    }

    Ok(platforms)
}

/// Query every platform concurrently; failing platforms contribute nothing
pub async fn find_all(platforms: &[Box<dyn PlatformAPI>], domain: &str) -> Vec<ProgramRecord> {
    let lookups = platforms.iter().map(|platform| async move {
        match platform.find_programs(domain).await {
            Ok(records) => {
                info!("{} returned {} programs for {}", platform.name(), records.len(), domain);
                records
            }
            Err(e) => {
                warn!("{} lookup for {} failed: {:#}", platform.name(), domain, e);
                Vec::new()
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

/// Extract domain from URL or pattern
/// Examples:
/// - "https://example.com" -> "example.com"
/// - "*.example.com" -> "*.example.com"
/// - "example.com" -> "example.com"
pub fn extract_domain(url_or_pattern: &str) -> String {
    let trimmed = url_or_pattern.trim();

    // If starts with wildcard, keep as-is
    if trimmed.starts_with("*.") {
        return trimmed.to_lowercase();
    }

    // If URL, parse and extract host
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        if let Ok(url) = url::Url::parse(trimmed) {
            if let Some(host) = url.host_str() {
                return host.to_string();
            }
        }
    }

    // Otherwise assume it's a domain
    trimmed.to_lowercase()
}

/// Whether a scope entry (plain or `*.` wildcard) covers the domain
pub fn scope_covers(scope: &str, domain: &str) -> bool {
    let scope = extract_domain(scope);
    match scope.strip_prefix("*.") {
        Some(root) => domain == root || domain.ends_with(&format!(".{}", root)),
        None => domain == scope,
    }
}

/// The organisation label of a domain, used to match platform handles
/// e.g. "www.example.co.uk" -> "example"
pub fn organisation_label(domain: &str) -> String {
    const SECOND_LEVEL: &[&str] = &["co", "com", "org", "net", "gov", "ac", "edu"];

    let host = domain.split(':').next().unwrap_or(domain).to_lowercase();
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();

    let label = match labels.len() {
        0 => "",
        1 => labels[0],
        n if n >= 3 && SECOND_LEVEL.contains(&labels[n - 2]) => labels[n - 3],
        n => labels[n - 2],
    };
    label.to_string()
}
