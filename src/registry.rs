//! Storage module registry
//!
//! Maps stable module names such as `caddy.storage.file_system` to factories
//! producing empty configuration values. The registry is an ordinary value:
//! it is built once during bootstrap, filled with `register`, and then shared
//! by reference with whatever decodes configuration.
//!
//! # Configuration shape
//!
//! A storage block names its module and carries the module's own fields:
//! ```json
//! { "module": "file_system", "root": "/var/lib/caddy" }
//! ```
//! The module may be given in short form (`file_system`) or fully qualified
//! (`caddy.storage.file_system`).

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::converter::{FileSystemStorage, StorageModule};

/// Namespace every storage module name lives under
pub const STORAGE_NAMESPACE: &str = "caddy.storage";

/// Field of a storage block naming its module
pub const MODULE_FIELD: &str = "module";

/// Errors that can occur while registering or decoding modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Module registered without a name
    #[error("Module name cannot be empty")]
    EmptyName,

    /// A module with this name is already registered
    #[error("Module already registered: {name}")]
    Duplicate { name: String },

    /// No module registered under this name
    #[error("Unknown storage module: {name}")]
    UnknownModule { name: String },

    /// Storage block lacks a string `module` field
    #[error("Storage configuration must name its module in a \"module\" string field")]
    MissingModuleField,

    /// Module fields could not be decoded
    #[error("Invalid configuration for module '{module}': {reason}")]
    Decode { module: String, reason: String },
}

/// A registration entry: module name and the factory for empty values
#[derive(Clone, Copy)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub new: fn() -> Box<dyn StorageModule>,
}

impl fmt::Debug for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInfo").field("name", &self.name).finish()
    }
}

/// Registry of known storage modules
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<&'static str, ModuleInfo>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module.
    ///
    /// A duplicate name leaves the registry unchanged and is reported as an
    /// error; it indicates a wiring mistake rather than bad configuration.
    pub fn register(&mut self, info: ModuleInfo) -> Result<(), RegistryError> {
        if info.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.modules.contains_key(info.name) {
            return Err(RegistryError::Duplicate {
                name: info.name.to_string(),
            });
        }

        debug!("Registered module {}", info.name);
        self.modules.insert(info.name, info);
        Ok(())
    }

    /// Get a module by its fully-qualified name
    pub fn get(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.modules.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Fresh, empty configuration value for `name`
    pub fn new_instance(&self, name: &str) -> Option<Box<dyn StorageModule>> {
        self.get(name).map(|info| (info.new)())
    }

    /// Decode a storage block into a populated configuration value.
    pub fn decode_storage(&self, raw: &Value) -> Result<Box<dyn StorageModule>, RegistryError> {
        let mut fields = match raw {
            Value::Object(map) => map.clone(),
            _ => return Err(RegistryError::MissingModuleField),
        };

        let name = match fields.remove(MODULE_FIELD) {
            Some(Value::String(module)) => qualified_name(&module),
            _ => return Err(RegistryError::MissingModuleField),
        };

        let mut module = self
            .new_instance(&name)
            .ok_or_else(|| RegistryError::UnknownModule { name: name.clone() })?;

        module
            .populate(Value::Object(fields))
            .map_err(|e| RegistryError::Decode {
                module: name.clone(),
                reason: e.to_string(),
            })?;

        debug!("Decoded storage module {}: {:?}", name, module);
        Ok(module)
    }

    /// Create a registry holding the modules this crate provides
    pub fn with_standard_modules() -> Self {
        let mut registry = Self::new();
        register_standard_modules(&mut registry)
            .expect("Standard modules should register once"); // Safe: fixed, distinct names
        registry
    }
}

/// Register the modules this crate provides
pub fn register_standard_modules(registry: &mut ModuleRegistry) -> Result<(), RegistryError> {
    registry.register(FileSystemStorage::module_info())
}

/// Expand a short module name into the storage namespace
pub fn qualified_name(module: &str) -> String {
    let prefix = format!("{STORAGE_NAMESPACE}.");
    if module.starts_with(&prefix) {
        module.to_string()
    } else {
        format!("{prefix}{module}")
    }
}

// Convert RegistryError to the main StorageError type
impl From<RegistryError> for crate::error::StorageError {
    fn from(err: RegistryError) -> Self {
        crate::error::StorageError::Module(err.to_string())
    }
}
