//! caddy-storage - main entry point
//!
//! Small operator tool over the library: shows default locations, lists
//! registered modules and checks which storage a configuration selects.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use caddy_storage::cli::{Cli, Commands};
use caddy_storage::{dirs, EnvSnapshot, ModuleRegistry, RuntimeConfig, Storage};

/// Initialize logging; RUST_LOG overrides the default level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load a configuration file and build the storage engine it selects
fn load_engine(config: &Path, registry: &ModuleRegistry) -> Result<Arc<dyn Storage>> {
    info!("Loading configuration file: {:?}", config);
    let runtime = RuntimeConfig::load_from_file(config)?;
    runtime.storage_engine(registry, &EnvSnapshot::capture())
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    debug!("CLI arguments parsed: {:?}", cli);

    let registry = ModuleRegistry::with_standard_modules();

    match cli.command {
        Commands::Dirs { platform } => {
            let mut env = EnvSnapshot::capture();
            if let Some(platform) = platform {
                env = env.with_platform(platform);
            }
            println!("home: {}", dirs::home_dir(&env));
            println!("data: {}", dirs::data_dir(&env));
        }
        Commands::Modules => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Commands::Validate { config } => match load_engine(&config, &registry) {
            Ok(engine) => {
                info!("Configuration validation successful");
                println!("✓ Storage is valid: {}", engine.describe());
            }
            Err(e) => {
                error!("Configuration validation failed: {:#}", e);
                eprintln!("✗ Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
        Commands::List {
            config,
            prefix,
            recursive,
        } => {
            let engine = load_engine(&config, &registry)?;
            for key in engine.list(&prefix, recursive)? {
                println!("{}", key);
            }
        }
    }

    Ok(())
}
