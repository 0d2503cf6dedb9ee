//! Registry state persisted between invocations.
//!
//! The state file is JSON holding the registry snapshot plus the event log. A
//! missing file is an empty registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use commit_registry::{
    CommitEvent, CommitmentRegistry, EventEmitter, EventJournal, RegistryConfig, RegistrySnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliResult;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateFile {
    pub registry: RegistrySnapshot,
    #[serde(default)]
    pub events: Vec<CommitEvent>,
}

impl StateFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No state file, starting empty");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write through a sibling temp file so a failed write leaves the old state intact.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), records = self.registry.store.records.len(), "State saved");
        Ok(())
    }
}

/// A registry opened from a state file, with its event log attached.
pub struct Session {
    pub registry: CommitmentRegistry,
    pub journal: Arc<EventJournal>,
    path: PathBuf,
}

impl Session {
    pub fn open(path: &Path, config: RegistryConfig) -> CliResult<Self> {
        let state = StateFile::load(path)?;
        let mut registry = CommitmentRegistry::restore(config, state.registry)?;

        let journal = Arc::new(EventJournal::new());
        for event in &state.events {
            journal.publish(event);
        }
        registry.add_emitter(journal.clone());

        Ok(Self {
            registry,
            journal,
            path: path.to_path_buf(),
        })
    }

    pub fn save(&self) -> CliResult<()> {
        StateFile {
            registry: self.registry.snapshot(),
            events: self.journal.events(),
        }
        .save(&self.path)
    }
}
