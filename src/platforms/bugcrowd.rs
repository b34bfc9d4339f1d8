//! Bugcrowd API integration for authoritative program lookups

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::{organisation_label, PlatformAPI};
use crate::types::{ProgramRecord, Source};

/// Bugcrowd API client
pub struct BugcrowdAPI {
    api_token: String,
    client: reqwest::Client,
    base_url: String,
}

impl BugcrowdAPI {
    /// Create new Bugcrowd API client
    pub fn new(api_token: String, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.bugcrowd+json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_token,
            client,
            base_url: "https://api.bugcrowd.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch programs list
    async fn fetch_programs_list(&self) -> Result<Vec<Value>> {
        debug!("Fetching programs from Bugcrowd");

        let url = format!("{}/programs", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("page[limit]", "100")])
            .header(AUTHORIZATION, format!("Token {}", self.api_token))
            .send()
            .await
            .context("Failed to send request to Bugcrowd API")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Bugcrowd API returned error: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse Bugcrowd API response")?;

        let programs = json["data"]
            .as_array()
            .context("Invalid response format from Bugcrowd")?
            .clone();

        debug!("Found {} programs on Bugcrowd", programs.len());
        Ok(programs)
    }
}

#[async_trait]
impl PlatformAPI for BugcrowdAPI {
    fn name(&self) -> &str {
        "Bugcrowd"
    }

    async fn find_programs(&self, domain: &str) -> Result<Vec<ProgramRecord>> {
        let label = organisation_label(domain);
        if label.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<ProgramRecord> = self
            .fetch_programs_list()
            .await?
            .iter()
            .filter_map(|program| {
                let attributes = &program["attributes"];
                let code = attributes["code"].as_str().unwrap_or("");
                let name = attributes["name"].as_str().unwrap_or("");

                if code.is_empty() {
                    return None;
                }

                // Codes are slugs, so require an exact label match; names may carry suffixes
                let matches = code.eq_ignore_ascii_case(&label)
                    || name.to_lowercase().split_whitespace().any(|word| word == label);
                if !matches {
                    return None;
                }

                let mut record = ProgramRecord::new(
                    Source::Bugcrowd,
                    format!("https://bugcrowd.com/{}", code),
                    domain,
                );
                record.description = name.to_string();
                Some(record)
            })
            .collect();

        info!("Bugcrowd matched {} programs for {}", records.len(), domain);
        Ok(records)
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/programs", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Token {}", self.api_token))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
