// src/credentials.rs
//! Session-only holder for platform API credentials

use anyhow::Result;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::settings::{get_string, SettingsStore, BUGCROWD_API_KEY, HACKERONE_API_KEY, HACKERONE_USERNAME_KEY};

/// API credentials as sent with an `unlockKeys` message
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub hackerone_username: Option<String>,
    #[serde(default)]
    pub hackerone_api_key: Option<String>,
    #[serde(default)]
    pub bugcrowd_api_key: Option<String>,
}

impl Credentials {
    /// HackerOne needs both a username and a token
    pub fn hackerone(&self) -> Option<(&str, &str)> {
        match (&self.hackerone_username, &self.hackerone_api_key) {
            (Some(user), Some(key)) if !user.is_empty() && !key.is_empty() => Some((user.as_str(), key.as_str())),
            _ => None,
        }
    }

    pub fn bugcrowd(&self) -> Option<&str> {
        self.bugcrowd_api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.hackerone().is_none() && self.bugcrowd().is_none()
    }

    /// Read the credentials persisted in settings
    pub async fn from_settings(store: &dyn SettingsStore) -> Result<Self> {
        Ok(Self {
            hackerone_username: get_string(store, HACKERONE_USERNAME_KEY).await?,
            hackerone_api_key: get_string(store, HACKERONE_API_KEY).await?,
            bugcrowd_api_key: get_string(store, BUGCROWD_API_KEY).await?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("hackerone_username", &self.hackerone_username)
            .field("hackerone_api_key", &self.hackerone_api_key.as_ref().map(|_| "<redacted>"))
            .field("bugcrowd_api_key", &self.bugcrowd_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// In-memory credential slot; never written to disk
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn unlock(&self, credentials: Credentials) {
        info!("Platform API keys unlocked for this session");
        *self.inner.write().await = Some(credentials);
    }

    pub async fn lock(&self) {
        info!("Platform API keys locked");
        *self.inner.write().await = None;
    }

    pub async fn current(&self) -> Option<Credentials> {
        self.inner.read().await.clone()
    }

    pub async fn is_unlocked(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
