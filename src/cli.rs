use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::Platform;

/// caddy-storage - inspect configuration-driven storage backends
#[derive(Parser, Debug)]
#[command(name = "caddy-storage")]
#[command(about = "Resolve, validate and inspect storage backends selected by configuration")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the default home and data directories
    Dirs {
        /// Resolve as if running on this platform (linux, macos, windows, unix)
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// List registered storage modules
    Modules,
    /// Validate a configuration file and build its storage engine
    Validate {
        /// Path to the JSON configuration file
        config: PathBuf,
    },
    /// List keys in the storage a configuration file selects
    List {
        /// Path to the JSON configuration file
        config: PathBuf,
        /// Only list keys under this prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
        /// Include every descendant, not just direct children
        #[arg(short, long)]
        recursive: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dirs_with_platform() {
        let cli = Cli::try_parse_from(["caddy-storage", "dirs", "--platform", "windows"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Dirs {
                platform: Some(Platform::Windows)
            }
        ));
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::try_parse_from([
            "caddy-storage",
            "-v",
            "list",
            "caddy.json",
            "--prefix",
            "certificates",
            "--recursive",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::List {
                config,
                prefix,
                recursive,
            } => {
                assert_eq!(config, PathBuf::from("caddy.json"));
                assert_eq!(prefix, "certificates");
                assert!(recursive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_platform() {
        assert!(Cli::try_parse_from(["caddy-storage", "dirs", "--platform", "beos"]).is_err());
    }
}
