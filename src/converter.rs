//! Storage converter contract.
//!
//! A storage configuration is a plain serde value that knows how to turn
//! itself into a live engine. The runtime never names concrete engines: it
//! asks the module registry for an empty configuration, lets serde fill it
//! in, and calls [`StorageConverter::to_storage_engine`].
//!
//! Wrapping engines this way keeps engine types free of configuration
//! concerns (serde attributes, module names), and lets any [`Storage`]
//! implementation be exposed to configuration by writing a small wrapper.
//!
//! # Contract
//!
//! - Conversion takes `&self`: the configuration is never modified.
//! - Every call returns an independent handle; calling it twice is fine.
//! - Errors come only from constructing the engine.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::{FileStorage, Storage};
use crate::error::Result;
use crate::registry::ModuleInfo;

/// A configuration value that can produce a usable storage engine.
///
/// The returned handle may be short-lived.
pub trait StorageConverter {
    fn to_storage_engine(&self) -> Result<Arc<dyn Storage>>;
}

/// Fully-qualified registry name of a storage configuration type
pub trait ModuleName {
    const NAME: &'static str;
}

/// Object-safe view of a registered storage configuration.
///
/// Implemented automatically for every deserializable [`StorageConverter`]
/// that declares a [`ModuleName`].
pub trait StorageModule: StorageConverter + fmt::Debug + Send + Sync {
    /// Registry name of this module
    fn module_name(&self) -> &'static str;

    /// Replace this value with one decoded from `raw`
    fn populate(&mut self, raw: serde_json::Value) -> std::result::Result<(), serde_json::Error>;
}

impl<T> StorageModule for T
where
    T: StorageConverter + ModuleName + DeserializeOwned + fmt::Debug + Send + Sync,
{
    fn module_name(&self) -> &'static str {
        T::NAME
    }

    fn populate(&mut self, raw: serde_json::Value) -> std::result::Result<(), serde_json::Error> {
        *self = serde_json::from_value(raw)?;
        Ok(())
    }
}

/// Configuration for the file-system storage engine.
///
/// ```json
/// { "module": "file_system", "root": "/var/lib/caddy" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSystemStorage {
    /// Base directory; empty lets the engine pick its default
    pub root: String,
}

impl ModuleName for FileSystemStorage {
    const NAME: &'static str = "caddy.storage.file_system";
}

impl FileSystemStorage {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Registry entry for this module
    pub fn module_info() -> ModuleInfo {
        ModuleInfo {
            name: Self::NAME,
            new: || -> Box<dyn StorageModule> { Box::new(Self::default()) },
        }
    }

    /// The concrete engine this configuration describes
    pub fn file_storage(&self) -> FileStorage {
        FileStorage::new(self.root.clone())
    }
}

impl StorageConverter for FileSystemStorage {
    fn to_storage_engine(&self) -> Result<Arc<dyn Storage>> {
        Ok(Arc::new(self.file_storage()))
    }
}

// Interface guard
const _: () = {
    const fn assert_converter<T: StorageConverter>() {}
    assert_converter::<FileSystemStorage>();
};
