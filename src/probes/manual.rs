//! Programs the user registered by hand

use async_trait::async_trait;
use tracing::warn;

use super::Probe;
use crate::registry::ManualRegistry;
use crate::types::{ProgramRecord, Source};

pub struct ManualProbe {
    registry: ManualRegistry,
}

impl ManualProbe {
    pub fn new(registry: ManualRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Probe for ManualProbe {
    fn name(&self) -> &str {
        "manual registry"
    }

    async fn run(&self, domain: &str) -> Vec<ProgramRecord> {
        match self.registry.entries_for(domain).await {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| ProgramRecord::new(Source::Manual, entry.url, domain))
                .collect(),
            Err(e) => {
                warn!("Ignoring unreadable manual registry: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemorySettingsStore, SettingsStore, MANUAL_PROGRAMS_KEY};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_manual_entry_becomes_record() {
        let registry = ManualRegistry::new(Arc::new(MemorySettingsStore::new()));
        registry.add("example.com", "https://example.com/bounty").await.unwrap();
        registry.add("other.com", "https://other.com/bounty").await.unwrap();

        let records = ManualProbe::new(registry).run("example.com").await;

        assert_eq!(
            records,
            vec![ProgramRecord::new(Source::Manual, "https://example.com/bounty", "example.com")]
        );
    }

    #[tokio::test]
    async fn test_corrupt_registry_yields_nothing() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(MANUAL_PROGRAMS_KEY, json!({"not": "a list"})).await.unwrap();

        let records = ManualProbe::new(ManualRegistry::new(store)).run("example.com").await;
        assert!(records.is_empty());
    }
}
