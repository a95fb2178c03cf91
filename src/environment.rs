//! Environment snapshots
//!
//! Directory resolution reads a handful of environment variables. Rather than
//! calling `std::env::var` deep inside the resolver, callers hand it an
//! `EnvSnapshot`: either captured from the running process or assembled by
//! hand, which keeps the resolver testable without touching process state.

use std::collections::HashMap;

use crate::types::Platform;

/// User home directory (Unix, and honoured first on every platform)
pub const HOME: &str = "HOME";
/// Drive letter of the home directory (Windows)
pub const HOMEDRIVE: &str = "HOMEDRIVE";
/// Drive-relative path of the home directory (Windows)
pub const HOMEPATH: &str = "HOMEPATH";
/// Profile directory (Windows)
pub const USERPROFILE: &str = "USERPROFILE";
/// XDG base directory for user data files
pub const XDG_DATA_HOME: &str = "XDG_DATA_HOME";

/// Variables captured by [`EnvSnapshot::capture`]
pub const TRACKED_VARS: [&str; 5] = [HOME, HOMEDRIVE, HOMEPATH, USERPROFILE, XDG_DATA_HOME];

/// The environment variables and platform a resolver call sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
    platform: Platform,
}

impl EnvSnapshot {
    /// Create an empty snapshot for the given platform
    pub fn new(platform: Platform) -> Self {
        Self {
            vars: HashMap::new(),
            platform,
        }
    }

    /// Build a snapshot from an existing variable map
    pub fn from_map(platform: Platform, vars: HashMap<String, String>) -> Self {
        Self { vars, platform }
    }

    /// Read the tracked variables from the running process.
    ///
    /// Values that are not valid UTF-8 are converted lossily.
    pub fn capture() -> Self {
        let vars = TRACKED_VARS
            .iter()
            .filter_map(|name| {
                std::env::var_os(name)
                    .map(|value| (name.to_string(), value.to_string_lossy().into_owned()))
            })
            .collect();

        Self {
            vars,
            platform: Platform::current(),
        }
    }

    /// Set a variable, returning the updated snapshot
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Replace the platform, returning the updated snapshot
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Value of `name`, or the empty string when unset
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}
