//! HackerOne API integration for authoritative program lookups

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{extract_domain, organisation_label, scope_covers, PlatformAPI};
use crate::types::{ProgramRecord, Source};

/// HackerOne API client
pub struct HackerOneAPI {
    username: String,
    api_token: String,
    client: reqwest::Client,
    base_url: String,
}

impl HackerOneAPI {
    /// Create new HackerOne API client
    pub fn new(username: String, api_token: String, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            username,
            api_token,
            client,
            base_url: "https://api.hackerone.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch programs list
    async fn fetch_programs_list(&self) -> Result<Vec<Value>> {
        debug!("Fetching programs from HackerOne");

        let url = format!("{}/v1/hackers/programs", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("page[size]", "100")])
            .basic_auth(&self.username, Some(&self.api_token))
            .send()
            .await
            .context("Failed to send request to HackerOne API")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "HackerOne API returned error: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse HackerOne API response")?;

        let programs = json["data"]
            .as_array()
            .context("Invalid response format from HackerOne")?
            .clone();

        debug!("Found {} programs on HackerOne", programs.len());
        Ok(programs)
    }

    /// Fetch structured scope for a program
    async fn fetch_program_scope(&self, handle: &str) -> Result<Vec<String>> {
        debug!("Fetching scope for program: {}", handle);

        let url = format!("{}/v1/hackers/programs/{}", self.base_url, handle);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .send()
            .await
            .context("Failed to fetch program details")?;

        if !response.status().is_success() {
            warn!(
                "Failed to fetch scope for {}: {}",
                handle,
                response.status()
            );
            return Ok(Vec::new());
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse program details")?;

        let mut domains = Vec::new();

        if let Some(scopes) = json["relationships"]["structured_scopes"]["data"].as_array() {
            for scope in scopes {
                let attributes = &scope["attributes"];

                // Only process in-scope items
                if !attributes["eligible_for_submission"].as_bool().unwrap_or(false) {
                    continue;
                }

                let asset_type = attributes["asset_type"].as_str().unwrap_or("");
                let asset_identifier = attributes["asset_identifier"].as_str().unwrap_or("");

                if (asset_type == "URL" || asset_type == "WILDCARD") && !asset_identifier.is_empty() {
                    domains.push(extract_domain(asset_identifier));
                }
            }
        }

        debug!("Found {} domains for program: {}", domains.len(), handle);
        Ok(domains)
    }
}

#[async_trait]
impl PlatformAPI for HackerOneAPI {
    fn name(&self) -> &str {
        "HackerOne"
    }

    async fn find_programs(&self, domain: &str) -> Result<Vec<ProgramRecord>> {
        let label = organisation_label(domain);
        if label.is_empty() {
            return Ok(Vec::new());
        }

        let programs_list = self.fetch_programs_list().await?;
        let mut records = Vec::new();

        for program_data in programs_list {
            let attributes = &program_data["attributes"];
            let handle = attributes["handle"].as_str().unwrap_or("").to_string();
            let name = attributes["name"].as_str().unwrap_or("").to_string();

            if handle.is_empty() {
                continue;
            }

            let is_candidate = handle.to_lowercase().contains(&label)
                || name.to_lowercase().contains(&label);
            if !is_candidate {
                continue;
            }

            let scope = match self.fetch_program_scope(&handle).await {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to fetch scope for {}: {}", handle, e);
                    Vec::new()
                }
            };

            let covered = scope.iter().any(|s| scope_covers(s, domain))
                || handle.eq_ignore_ascii_case(&label);
            if !covered {
                continue;
            }

            let mut record = ProgramRecord::new(
                Source::HackerOne,
                format!("https://hackerone.com/{}", handle),
                domain,
            );
            record.description = name;
            record.rewards = if attributes["offers_bounties"].as_bool().unwrap_or(false) {
                "Bounty".to_string()
            } else {
                "No bounty".to_string()
            };
            records.push(record);
        }

        info!("HackerOne matched {} programs for {}", records.len(), domain);
        Ok(records)
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/v1/hackers/programs", self.base_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> HackerOneAPI {
        HackerOneAPI::new("test_user".to_string(), "test_token".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.uri())
    }

    #[test]
    fn test_hackerone_api_creation() {
        let api = HackerOneAPI::new(
            "test_user".to_string(),
            "test_token".to_string(),
            Duration::from_secs(5),
        );
        assert!(api.is_ok());
    }

    #[tokio::test]
    async fn test_find_programs_by_structured_scope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/hackers/programs"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "1", "attributes": {"handle": "example_corp", "name": "Example Corp", "offers_bounties": true}},
                    {"id": "2", "attributes": {"handle": "unrelated", "name": "Unrelated Inc"}}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/hackers/programs/example_corp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "relationships": {"structured_scopes": {"data": [
                    {"attributes": {"asset_type": "WILDCARD", "asset_identifier": "*.example.com", "eligible_for_submission": true}},
                    {"attributes": {"asset_type": "URL", "asset_identifier": "legacy.example.net", "eligible_for_submission": false}}
                ]}}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/hackers/programs/unrelated"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let records = api(&server).find_programs("www.example.com").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].platform, Source::HackerOne);
        assert_eq!(records[0].link, "https://hackerone.com/example_corp");
        assert_eq!(records[0].description, "Example Corp");
        assert_eq!(records[0].rewards, "Bounty");
    }

    #[tokio::test]
    async fn test_out_of_scope_candidate_is_dropped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/hackers/programs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "1", "attributes": {"handle": "example_labs", "name": "Example Labs"}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/hackers/programs/example_labs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "relationships": {"structured_scopes": {"data": [
                    {"attributes": {"asset_type": "URL", "asset_identifier": "examplelabs.io", "eligible_for_submission": true}}
                ]}}
            })))
            .mount(&server)
            .await;

        let records = api(&server).find_programs("example.com").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_is_propagated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/hackers/programs"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let api = api(&server);
        assert!(api.find_programs("example.com").await.is_err());
        assert!(!api.test_connection().await.unwrap());
    }
}
