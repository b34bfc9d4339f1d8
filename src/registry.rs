// src/registry.rs
//! User-maintained registry of manually added programs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::settings::{SettingsStore, MANUAL_PROGRAMS_KEY};

/// A manually registered program for a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub domain: String,
    pub url: String,
    pub date_added: DateTime<Utc>,
}

/// Manual program entries persisted under the `manualPrograms` settings key
#[derive(Clone)]
pub struct ManualRegistry {
    store: Arc<dyn SettingsStore>,
}

impl ManualRegistry {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// All entries in insertion order
    pub async fn entries(&self) -> Result<Vec<ManualEntry>> {
        match self.store.get(MANUAL_PROGRAMS_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .context("Failed to parse manual program entries"),
            None => Ok(Vec::new()),
        }
    }

    /// Entries registered for exactly this domain
    pub async fn entries_for(&self, domain: &str) -> Result<Vec<ManualEntry>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|entry| entry.domain == domain)
            .collect())
    }

    /// Add an entry. Returns false if the (domain, url) pair already exists.
    pub async fn add(&self, domain: &str, url: &str) -> Result<bool> {
        let domain = domain.trim().to_lowercase();
        let url = url.trim();

        if domain.is_empty() || url.is_empty() {
            anyhow::bail!("Manual entries need both a domain and a URL");
        }

        if url::Url::parse(url).is_err() {
            warn!("Manual entry URL {} is not an absolute URL", url);
        }

        let mut entries = self.entries().await?;
        if entries.iter().any(|e| e.domain == domain && e.url == url) {
            info!("Manual entry {} -> {} already registered", domain, url);
            return Ok(false);
        }

        entries.push(ManualEntry {
            domain: domain.clone(),
            url: url.to_string(),
            date_added: Utc::now(),
        });
        self.save(&entries).await?;

        info!("Registered manual program {} -> {}", domain, url);
        Ok(true)
    }

    /// Remove an entry. Returns false if it was not registered.
    pub async fn remove(&self, domain: &str, url: &str) -> Result<bool> {
        let domain = domain.trim().to_lowercase();
        let url = url.trim();

        let mut entries = self.entries().await?;
        let before = entries.len();
        entries.retain(|e| !(e.domain == domain && e.url == url));

        if entries.len() == before {
            return Ok(false);
        }

        self.save(&entries).await?;
        info!("Removed manual program {} -> {}", domain, url);
        Ok(true)
    }

    async fn save(&self, entries: &[ManualEntry]) -> Result<()> {
        let value = serde_json::to_value(entries).context("Failed to serialize manual entries")?;
        self.store.set(MANUAL_PROGRAMS_KEY, value).await
    }
}
