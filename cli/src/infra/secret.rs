//! File-backed implementation of the `SecretStore` port.
//!
//! A YAML map from target ref to stored passcode, kept at 0600. Encryption
//! at rest belongs to the external credential service; this store only
//! resolves what that service has already provisioned onto the engine host.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::SecretStore;

pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn resolve_sync(&self, target: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading secrets file {}", self.path.display()))?;
        let map: HashMap<String, String> = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing secrets file {}", self.path.display()))?;
        Ok(map.get(target).cloned())
    }
}

impl SecretStore for FileSecretStore {
    async fn resolve(&self, target: &str) -> Result<Option<String>> {
        let store = Self::new(self.path.clone());
        let target = target.to_owned();
        tokio::task::spawn_blocking(move || store.resolve_sync(&target))
            .await
            .context("secret resolve task panicked")?
    }
}
