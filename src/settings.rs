// src/settings.rs
//! Key-value settings storage shared by the manual registry and credentials

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Key under which manual program entries are stored
pub const MANUAL_PROGRAMS_KEY: &str = "manualPrograms";
pub const HACKERONE_USERNAME_KEY: &str = "hackeroneUsername";
pub const HACKERONE_API_KEY: &str = "hackeroneApiKey";
pub const BUGCROWD_API_KEY: &str = "bugcrowdApiKey";

/// Get/set interface over persisted settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Volatile settings store, used in tests and when no settings file is wanted
#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.lock().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted to a JSON file
/// Every write rewrites the whole file through a temp file + rename
#[derive(Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: Arc<Mutex<Map<String, Value>>>,
}

impl FileSettingsStore {
    /// Open the settings file, starting empty if it does not exist yet
    pub async fn open(path: PathBuf) -> Result<Self> {
        let mut values = Map::new();

        if path.exists() {
            info!("Loading settings from {:?}", path);

            let contents = fs::read_to_string(&path)
                .await
                .context("Failed to read settings file")?;

            if !contents.trim().is_empty() {
                values = serde_json::from_str(&contents)
                    .context("Failed to parse settings file")?;
            }
        } else {
            info!("Settings file {:?} does not exist, starting fresh", path);
        }

        Ok(Self {
            path,
            values: Arc::new(Mutex::new(values)),
        })
    }

    async fn save(&self, values: &Map<String, Value>) -> Result<()> {
        debug!("Saving {} settings keys to {:?}", values.len(), self.path);

        let json = serde_json::to_string_pretty(values)
            .context("Failed to serialize settings")?;

        let temp_path = self.path.with_extension("tmp");

        fs::write(&temp_path, json)
            .await
            .context("Failed to write settings to temporary file")?;

        fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to rename temporary settings file")?;

        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.lock().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().await;

        // Memory only changes once the file holds the new value
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        self.save(&updated).await?;

        *values = updated;
        Ok(())
    }
}

/// Read a string setting, treating missing or non-string values as absent
pub async fn get_string(store: &dyn SettingsStore, key: &str) -> Result<Option<String>> {
    Ok(store
        .get(key)
        .await?
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|s| !s.is_empty()))
}
