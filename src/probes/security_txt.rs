//! security.txt discovery

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

use super::{build_client, fetch_text, Probe};
use crate::config::ProbeConfig;
use crate::types::{ProgramRecord, Source};

lazy_static! {
    static ref URL_IN_LINE: Regex = Regex::new(r#"(?i)https?://[^\s<>"']+"#).unwrap();
}

/// Fetches `/.well-known/security.txt`, falling back to `/security.txt`
pub struct SecurityTxtProbe {
    client: reqwest::Client,
    scheme: String,
    timeout: Duration,
}

impl SecurityTxtProbe {
    pub fn new(scheme: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent, timeout, true)?,
            scheme: scheme.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Self::new(
            &config.scheme,
            Duration::from_secs(config.security_txt_timeout_secs),
            &config.user_agent,
        )
    }

    /// Candidate locations, in the order they are tried
    pub fn candidate_urls(&self, domain: &str) -> [String; 2] {
        [
            format!("{}://{}/.well-known/security.txt", self.scheme, domain),
            format!("{}://{}/security.txt", self.scheme, domain),
        ]
    }

    async fn fetch(&self, domain: &str) -> Option<String> {
        for url in self.candidate_urls(domain) {
            if let Some(body) = fetch_text(&self.client, &url, self.timeout).await {
                debug!("Found security.txt at {}", url);
                return Some(body);
            }
        }
        None
    }
}

/// Trailing sentence punctuation is not part of the URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ')'];

/// One record per line that carries an http(s) URL; the first URL on the line wins
pub fn parse_security_txt(body: &str, domain: &str) -> Vec<ProgramRecord> {
    body.lines()
        .filter_map(|line| URL_IN_LINE.find(line))
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .filter(|link| link.split_once("://").is_some_and(|(_, rest)| !rest.is_empty()))
        .map(|link| ProgramRecord::new(Source::SecurityTxt, link, domain))
        .collect()
}

#[async_trait]
impl Probe for SecurityTxtProbe {
    fn name(&self) -> &str {
        "security.txt"
    }

    async fn run(&self, domain: &str) -> Vec<ProgramRecord> {
        match self.fetch(domain).await {
            Some(body) => parse_security_txt(&body, domain),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe(timeout: Duration) -> SecurityTxtProbe {
        SecurityTxtProbe::new("http", timeout, "bounty-scout-test").unwrap()
    }

    fn host_of(server: &MockServer) -> String {
        server.uri().trim_start_matches("http://").to_string()
    }

    #[test]
    fn test_parse_contact_line() {
        let records = parse_security_txt("Contact: https://hackerone.com/example\n", "example.com");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].platform, Source::SecurityTxt);
        assert_eq!(records[0].link, "https://hackerone.com/example");
        assert_eq!(records[0].scope, "example.com");
    }

    #[test]
    fn test_parse_ignores_lines_without_urls() {
        let body = "\
# Our security policy
Contact: mailto:security@example.com
Expires: 2030-01-01T00:00:00.000Z
Policy: https://example.com/security-policy
Hiring: http://example.com/jobs
Preferred-Languages: en";

        let records = parse_security_txt(body, "example.com");
        let links: Vec<&str> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://example.com/security-policy", "http://example.com/jobs"]
        );
    }

    #[test]
    fn test_parse_url_anywhere_on_line() {
        let records = parse_security_txt("see https://example.com/a and https://example.com/b", "example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://example.com/a");
    }

    #[test]
    fn test_parse_strips_delimiters_and_punctuation() {
        let body = "\
Contact: <https://example.com/report>
Policy: see https://example.com/policy.
Acknowledgments: (https://example.com/thanks)
Hiring: \"https://example.com/jobs\"";

        let records = parse_security_txt(body, "example.com");
        let links: Vec<&str> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/report",
                "https://example.com/policy",
                "https://example.com/thanks",
                "https://example.com/jobs",
            ]
        );
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_security_txt("", "example.com").is_empty());
    }

    #[tokio::test]
    async fn test_well_known_location_preferred() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/security.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Contact: https://hackerone.com/example"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/security.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Contact: https://bugcrowd.com/example"))
            .expect(0)
            .mount(&server)
            .await;

        let records = probe(Duration::from_secs(2)).run(&host_of(&server)).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://hackerone.com/example");
    }

    #[tokio::test]
    async fn test_falls_back_to_root_location() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/security.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/security.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Contact: https://bugcrowd.com/example"))
            .mount(&server)
            .await;

        let records = probe(Duration::from_secs(2)).run(&host_of(&server)).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://bugcrowd.com/example");
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_candidate() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/security.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Contact: https://slow.example/")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/security.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Contact: https://fast.example/"))
            .mount(&server)
            .await;

        let records = probe(Duration::from_millis(300)).run(&host_of(&server)).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://fast.example/");
    }

    #[tokio::test]
    async fn test_both_missing_yields_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(probe(Duration::from_secs(2)).run(&host_of(&server)).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_nothing() {
        // Port 9 (discard) is not listening on loopback
        let records = probe(Duration::from_millis(500)).run("127.0.0.1:9").await;
        assert!(records.is_empty());
    }
}
