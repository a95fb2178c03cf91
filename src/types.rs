//! Type-safe platform identifiers
//!
//! Directory resolution depends on the host operating system. Instead of
//! comparing `std::env::consts::OS` strings throughout the crate, the OS is
//! captured once as a `Platform` value that can also be overridden in tests
//! or from the command line.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[strum(serialize = "macos")]
    MacOs,
    Windows,
    /// Any other Unix-like system (BSDs, illumos, ...)
    Unix,
}

impl Platform {
    /// The platform this binary was compiled for
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a platform family
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" | "android" => Self::Linux,
            "macos" | "ios" => Self::MacOs,
            "windows" => Self::Windows,
            _ => Self::Unix,
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Preferred path separator
    pub fn separator(&self) -> char {
        if self.is_windows() { '\\' } else { '/' }
    }

    /// Whether `c` separates path elements. Windows accepts both slashes.
    pub fn is_separator(&self, c: char) -> bool {
        c == '/' || (self.is_windows() && c == '\\')
    }
}
