// src/lookup.rs
//! Domain lookup orchestration: fan out to every probe, merge, dedupe

use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, PlatformsConfig};
use crate::credentials::CredentialStore;
use crate::dedupe::merge_programs;
use crate::platforms;
use crate::probes::{HomepageProbe, ManualProbe, PlatformPathProbe, Probe, SecurityTxtProbe};
use crate::registry::ManualRegistry;
use crate::types::LookupResult;

/// Orchestration-level failures; the only errors that reach callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    NoActiveTab,
    InternalPage(String),
    UnresolvableDomain(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::NoActiveTab => write!(f, "No active tab"),
            LookupError::InternalPage(url) => write!(f, "Cannot check internal page {}", url),
            LookupError::UnresolvableDomain(input) => write!(f, "Cannot resolve a domain from {:?}", input),
        }
    }
}

impl std::error::Error for LookupError {}

/// Anything that can turn a domain into a lookup result
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup(&self, domain: &str) -> LookupResult;
}

/// Normalize user or tab input into a bare lowercase host (port kept if present)
pub fn normalize_domain(input: &str) -> Result<String, LookupError> {
    let trimmed = input.trim();
    let unresolvable = || LookupError::UnresolvableDomain(input.to_string());

    let candidate = if trimmed.contains("://") {
        let url = url::Url::parse(trimmed).map_err(|_| unresolvable())?;
        let host = url.host_str().ok_or_else(unresolvable)?;
        match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    } else {
        trimmed
            .split(['/', '?', '#'])
            .next()
            .unwrap_or("")
            .to_string()
    };

    let domain = candidate.trim_end_matches('.').to_lowercase();
    if domain.is_empty() || domain.chars().any(|c| c.is_whitespace() || c == '@') {
        return Err(unresolvable());
    }

    // Only a numeric port may follow a colon
    if let Some((host, port)) = domain.split_once(':') {
        if host.is_empty() || port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(unresolvable());
        }
    }
    Ok(domain)
}

/// Runs the probe pipeline for a domain
pub struct DomainLookup {
    /// Probes in tie-break order
    probes: Vec<Arc<dyn Probe>>,
    authority: Option<(CredentialStore, PlatformsConfig)>,
}

impl DomainLookup {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self {
            probes,
            authority: None,
        }
    }

    /// The standard pipeline: security.txt, homepage, platform paths, manual registry
    pub fn from_config(config: &Config, registry: ManualRegistry) -> Result<Self> {
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(SecurityTxtProbe::from_config(&config.probes)?),
            Arc::new(HomepageProbe::from_config(&config.probes)?),
            Arc::new(PlatformPathProbe::from_config(&config.probes)?),
            Arc::new(ManualProbe::new(registry)),
        ];
        Ok(Self::new(probes))
    }

    /// Consult platform APIs first whenever credentials are unlocked
    pub fn with_authority(mut self, credentials: CredentialStore, config: PlatformsConfig) -> Self {
        self.authority = Some((credentials, config));
        self
    }

    async fn authoritative(&self, domain: &str) -> Option<LookupResult> {
        let (store, config) = self.authority.as_ref()?;
        let credentials = store.current().await?;
        if credentials.is_empty() {
            return None;
        }

        let clients = match platforms::clients_for(&credentials, config) {
            Ok(clients) => clients,
            Err(e) => {
                warn!("Could not build platform API clients: {:#}", e);
                return None;
            }
        };

        let records = platforms::find_all(&clients, domain).await;
        if records.is_empty() {
            debug!("No authoritative hit for {}, falling back to probes", domain);
            return None;
        }

        Some(LookupResult::from_programs(merge_programs(records)))
    }

    async fn run_probes(&self, domain: &str) -> LookupResult {
        let runs = self.probes.iter().map(|probe| async move {
            let records = probe.run(domain).await;
            debug!("Probe {} produced {} records for {}", probe.name(), records.len(), domain);
            records
        });

        // join_all keeps probe order, which is the dedupe tie-break
        let combined = join_all(runs).await.into_iter().flatten();
        LookupResult::from_programs(merge_programs(combined))
    }
}

#[async_trait]
impl LookupService for DomainLookup {
    async fn lookup(&self, domain: &str) -> LookupResult {
        info!("Looking up bounty programs for {}", domain);

        if let Some(result) = self.authoritative(domain).await {
            info!("Platform API reported {} programs for {}", result.programs.len(), domain);
            return result;
        }

        let result = self.run_probes(domain).await;
        info!(
            "Lookup for {} finished: {} programs",
            domain,
            result.programs.len()
        );
        result
    }
}
