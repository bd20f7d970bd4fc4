// clipscrub/src/utils/app_state.rs
//! Location of the persisted rule document and construction of the rule store.
//!
//! The state directory holds `rules.json`. It is taken from `--state-dir` /
//! `CLIPSCRUB_STATE_DIR` when given, otherwise `<data dir>/clipscrub`.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clipscrub_core::{
    DefaultRulesSource, EmbeddedDefaults, FileDefaults, JsonFileStore, RuleStore,
};

const APP_DIR_NAME: &str = "clipscrub";

/// Resolves the directory that holds the persisted rules.
pub fn resolve_state_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        debug!("Using explicit state directory: {}", dir.display());
        return Ok(dir.to_path_buf());
    }
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .context("Could not determine a data directory; pass --state-dir")?;
    Ok(base.join(APP_DIR_NAME))
}

/// Everything a command needs to reach the persisted rules.
pub struct AppState {
    pub state_dir: PathBuf,
    pub store: Arc<RuleStore>,
}

impl AppState {
    /// Opens the file-backed store under `state_dir`. When `defaults` is set
    /// the store is seeded from that file instead of the bundled document.
    pub fn open(state_dir: PathBuf, defaults: Option<&Path>) -> Self {
        let source: Arc<dyn DefaultRulesSource> = match defaults {
            Some(path) => {
                debug!("Seeding defaults from {}", path.display());
                Arc::new(FileDefaults::new(path))
            }
            None => Arc::new(EmbeddedDefaults),
        };
        let store = RuleStore::new(Arc::new(JsonFileStore::new(&state_dir)), source);
        Self {
            state_dir,
            store: Arc::new(store),
        }
    }

    /// Path of the rule document inside the state directory.
    pub fn rules_path(&self) -> PathBuf {
        self.state_dir.join(format!("{}.json", clipscrub_core::RULES_KEY))
    }
}
