// src/messaging.rs
//! JSON request/response surface used by the popup and by `--serve`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::badge::{classify_url, TabSource, TabTarget};
use crate::credentials::{CredentialStore, Credentials};
use crate::lookup::{normalize_domain, LookupError, LookupService};
use crate::types::LookupResult;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Look up the active tab, or `domain` when given
    RunLookup {
        #[serde(default)]
        domain: Option<String>,
    },
    UnlockKeys { credentials: Credentials },
    LockKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<LookupResult>,
    },
    Error { error: String },
}

impl Response {
    fn message(message: &str) -> Self {
        Response::Ok {
            message: message.to_string(),
            data: None,
        }
    }

    fn error(error: impl ToString) -> Self {
        Response::Error {
            error: error.to_string(),
        }
    }
}

/// Dispatches requests to the lookup pipeline and the credential holder
pub struct MessageRouter {
    lookup: Arc<dyn LookupService>,
    tabs: Arc<dyn TabSource>,
    credentials: CredentialStore,
}

impl MessageRouter {
    pub fn new(lookup: Arc<dyn LookupService>, tabs: Arc<dyn TabSource>, credentials: CredentialStore) -> Self {
        Self {
            lookup,
            tabs,
            credentials,
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::RunLookup { domain } => match self.run_lookup(domain).await {
                Ok(data) => Response::Ok {
                    message: "Lookup complete".to_string(),
                    data: Some(data),
                },
                Err(e) => {
                    debug!("runLookup rejected: {}", e);
                    Response::error(e)
                }
            },
            Request::UnlockKeys { credentials } => {
                self.credentials.unlock(credentials).await;
                Response::message("Keys unlocked")
            }
            Request::LockKeys => {
                self.credentials.lock().await;
                Response::message("Keys locked")
            }
        }
    }

    /// Parse one JSON request and answer it; malformed input yields an error response
    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("Malformed request: {}", e);
                Response::error(format!("Invalid request: {}", e))
            }
        }
    }

    /// Answer newline-delimited JSON requests until the reader is exhausted
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut handled = 0;

        while let Some(line) = lines.next_line().await.context("Failed to read request")? {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line).await;
            let mut encoded = serde_json::to_string(&response).context("Failed to encode response")?;
            encoded.push('\n');

            writer
                .write_all(encoded.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await?;
            handled += 1;
        }

        info!("Message router handled {} requests", handled);
        Ok(handled)
    }

    // Popup lookups always run fresh; the cache only holds outcomes
    async fn run_lookup(&self, domain: Option<String>) -> Result<LookupResult, LookupError> {
        let domain = match domain {
            Some(input) => normalize_domain(&input)?,
            None => self.active_domain().await?,
        };

        Ok(self.lookup.lookup(&domain).await)
    }

    async fn active_domain(&self) -> Result<String, LookupError> {
        let tab = match self.tabs.active_tab().await {
            Ok(Some(tab)) => tab,
            Ok(None) => return Err(LookupError::NoActiveTab),
            Err(e) => {
                debug!("Could not query active tab: {:#}", e);
                return Err(LookupError::NoActiveTab);
            }
        };

        match classify_url(&tab.url) {
            Ok(TabTarget::Site(domain)) => Ok(domain),
            Ok(TabTarget::Internal) => Err(LookupError::InternalPage(tab.url)),
            Err(_) => Err(LookupError::UnresolvableDomain(tab.url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::StaticTabs;
    use crate::types::{ProgramRecord, Source};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    /// Records every domain it is asked about
    #[derive(Default)]
    struct RecordingLookup {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LookupService for RecordingLookup {
        async fn lookup(&self, domain: &str) -> LookupResult {
            self.seen.lock().await.push(domain.to_string());
            LookupResult::from_programs(vec![ProgramRecord::new(
                Source::Manual,
                format!("https://{}/bounty", domain),
                domain,
            )])
        }
    }

    struct Fixture {
        lookup: Arc<RecordingLookup>,
        tabs: Arc<StaticTabs>,
        credentials: CredentialStore,
        router: MessageRouter,
    }

    fn fixture() -> Fixture {
        let lookup = Arc::new(RecordingLookup::default());
        let tabs = Arc::new(StaticTabs::new());
        let credentials = CredentialStore::new();
        let router = MessageRouter::new(lookup.clone(), tabs.clone(), credentials.clone());
        Fixture {
            lookup,
            tabs,
            credentials,
            router,
        }
    }

    fn to_json(response: &Response) -> Value {
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_run_lookup_uses_active_tab() {
        let f = fixture();
        f.tabs.open(1, "https://Shop.Example.com/cart").await;
        f.tabs.activate(1).await;

        let response = f.router.handle_line(r#"{"action":"runLookup"}"#).await;
        let value = to_json(&response);

        assert_eq!(value["data"]["found"], json!(true));
        assert_eq!(value["data"]["programs"][0]["platform"], json!("Manual"));
        assert!(value["message"].is_string());
        assert_eq!(*f.lookup.seen.lock().await, vec!["shop.example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_run_lookup_with_explicit_domain() {
        let f = fixture();

        let response = f
            .router
            .handle_line(r#"{"action":"runLookup","domain":"https://example.org/x"}"#)
            .await;

        assert_eq!(to_json(&response)["data"]["found"], json!(true));
        assert_eq!(*f.lookup.seen.lock().await, vec!["example.org".to_string()]);
    }

    #[tokio::test]
    async fn test_run_lookup_without_active_tab() {
        let f = fixture();

        let response = f.router.handle(Request::RunLookup { domain: None }).await;

        assert_eq!(response, Response::error(LookupError::NoActiveTab));
        assert!(f.lookup.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_lookup_on_internal_page() {
        let f = fixture();
        f.tabs.open(2, "chrome://extensions").await;
        f.tabs.activate(2).await;

        let value = to_json(&f.router.handle(Request::RunLookup { domain: None }).await);

        assert!(value["error"].as_str().unwrap().contains("chrome://extensions"));
        assert!(f.lookup.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_lookup_unresolvable_domain() {
        let f = fixture();

        let value = to_json(
            &f.router
                .handle(Request::RunLookup {
                    domain: Some("not a domain".to_string()),
                })
                .await,
        );

        assert!(value.get("error").is_some());
        assert!(value.get("data").is_none());
    }

    #[tokio::test]
    async fn test_unlock_and_lock_keys() {
        let f = fixture();

        let response = f
            .router
            .handle_line(r#"{"action":"unlockKeys","credentials":{"bugcrowdApiKey":"secret"}}"#)
            .await;
        assert_eq!(to_json(&response), json!({"message": "Keys unlocked"}));
        assert!(f.credentials.is_unlocked().await);
        assert_eq!(
            f.credentials.current().await.unwrap().bugcrowd(),
            Some("secret")
        );

        let response = f.router.handle_line(r#"{"action":"lockKeys"}"#).await;
        assert_eq!(to_json(&response), json!({"message": "Keys locked"}));
        assert!(!f.credentials.is_unlocked().await);
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let f = fixture();

        let value = to_json(&f.router.handle_line(r#"{"action":"selfDestruct"}"#).await);
        assert!(value["error"].as_str().unwrap().starts_with("Invalid request"));

        let value = to_json(&f.router.handle_line("not json").await);
        assert!(value.get("error").is_some());
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let f = fixture();
        let input = concat!(
            r#"{"action":"runLookup","domain":"example.com"}"#,
            "\n\n",
            r#"{"action":"lockKeys"}"#,
            "\n",
        );
        let mut output = Vec::new();

        let handled = f.router.serve(input.as_bytes(), &mut output).await.unwrap();
        assert_eq!(handled, 2);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["data"]["programs"][0]["scope"], json!("example.com"));
        assert_eq!(lines[1]["message"], json!("Keys locked"));
    }
}
