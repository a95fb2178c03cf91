//! Runtime configuration file handling.
//!
//! The storage block is kept as raw JSON until the module registry decodes
//! it, so third-party modules can carry fields this crate knows nothing
//! about.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::converter::{StorageConverter, StorageModule};
use crate::dirs;
use crate::engine::{FileStorage, Storage};
use crate::environment::EnvSnapshot;
use crate::registry::ModuleRegistry;

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Storage module block, e.g. `{"module": "file_system", "root": "..."}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<serde_json::Value>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with the given storage block
    pub fn with_storage(storage: serde_json::Value) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse configuration JSON")
    }

    /// Decode the storage block without building an engine.
    ///
    /// Returns `None` when no storage is configured.
    pub fn storage_module(&self, registry: &ModuleRegistry) -> Result<Option<Box<dyn StorageModule>>> {
        self.storage
            .as_ref()
            .map(|raw| {
                registry
                    .decode_storage(raw)
                    .context("Failed to decode storage configuration")
            })
            .transpose()
    }

    /// Build the storage engine this configuration selects.
    ///
    /// Without a storage block the runtime falls back to file storage in the
    /// default data directory resolved from `env`.
    pub fn storage_engine(
        &self,
        registry: &ModuleRegistry,
        env: &EnvSnapshot,
    ) -> Result<Arc<dyn Storage>> {
        match self.storage_module(registry)? {
            Some(module) => {
                let engine = module.to_storage_engine().with_context(|| {
                    format!("Storage module {} failed to start", module.module_name())
                })?;
                info!("Using {} storage: {}", module.module_name(), engine.describe());
                Ok(engine)
            }
            None => {
                let engine = FileStorage::with_env(dirs::data_dir(env), env);
                info!("No storage configured, using {}", engine.describe());
                Ok(Arc::new(engine))
            }
        }
    }
}
