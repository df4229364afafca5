//! Subcommand implementations.

pub mod calibrate;
pub mod estimate;
pub mod init;
pub mod next_item;
pub mod progression;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adaptest_core::config::AdaptestConfig;
use adaptest_core::engine::AdaptiveEngine;
use adaptest_store::{InMemoryStore, Snapshot};

/// A loaded snapshot wired into an engine.
pub(crate) struct Session {
    pub store: Arc<InMemoryStore>,
    pub engine: AdaptiveEngine,
}

impl Session {
    pub fn open(data: &Path, config: &AdaptestConfig) -> Result<Self> {
        let snapshot = Snapshot::load_json(data)?;
        tracing::debug!(
            "loaded {} items, {} attempts, {} profiles from {}",
            snapshot.items.len(),
            snapshot.attempts.len(),
            snapshot.profiles.len(),
            data.display()
        );
        let store = Arc::new(InMemoryStore::new(snapshot));
        let engine = AdaptiveEngine::new(store.clone(), store.clone(), store.clone(), config);
        Ok(Self { store, engine })
    }

    /// Write the store's current contents back to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.store.snapshot()?.save_json(path)?;
        eprintln!("Snapshot written to: {}", path.display());
        Ok(())
    }
}

/// Split a comma-separated ID list, dropping empty entries.
pub(crate) fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
