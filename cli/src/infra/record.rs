//! File-backed implementation of the `RecordStore` port.
//!
//! One JSON file per host record under the configured records directory.
//! Records are created by the CRUD collaborator; this store only reads them
//! and rewrites the agent-state slice, atomically (temp file + rename) so a
//! crashed write cannot corrupt a record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use deskpilot_common::{HostRecord, PersistedAgentState};

use crate::application::ports::RecordStore;
use crate::domain::target::validate_target_ref;

pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn record_path(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{target}.json"))
    }

    fn load_sync(&self, target: &str) -> Result<Option<HostRecord>> {
        let path = self.record_path(target);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading record {}", path.display()))?;
        let record: HostRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing record {}", path.display()))?;
        Ok(Some(record))
    }

    fn save_sync(&self, target: &str, state: &PersistedAgentState) -> Result<()> {
        let mut record = self
            .load_sync(target)?
            .with_context(|| format!("no host record named '{target}'"))?;
        record.agent = state.clone();

        let path = self.record_path(target);
        let content = serde_json::to_string_pretty(&record).context("serializing record")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("finalizing record {}", path.display()))?;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    async fn load(&self, target: &str) -> Result<Option<HostRecord>> {
        validate_target_ref(target)?;
        let store = Self::new(self.dir.clone());
        let target = target.to_owned();
        tokio::task::spawn_blocking(move || store.load_sync(&target))
            .await
            .context("record load task panicked")?
    }

    async fn save_agent_state(&self, target: &str, state: &PersistedAgentState) -> Result<()> {
        validate_target_ref(target)?;
        let store = Self::new(self.dir.clone());
        let target = target.to_owned();
        let state = state.clone();
        tokio::task::spawn_blocking(move || store.save_sync(&target, &state))
            .await
            .context("record save task panicked")?
    }
}
