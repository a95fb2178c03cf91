//! caddy-storage Library
//!
//! Configuration-driven storage backends: a registry of named storage
//! modules, the conversion from configuration to a live engine, and the
//! resolution of default storage locations.

pub mod cli;
pub mod config;
pub mod converter;
pub mod dirs;
pub mod engine;
pub mod environment;
pub mod error;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use config::RuntimeConfig;
pub use converter::{FileSystemStorage, ModuleName, StorageConverter, StorageModule};
pub use dirs::{data_dir, home_dir};
pub use engine::{FileStorage, KeyInfo, Storage};
pub use environment::EnvSnapshot;
pub use error::StorageError;
pub use registry::{ModuleInfo, ModuleRegistry, RegistryError};
pub use types::Platform;
