//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init` for inspecting
//! and creating the tracking configuration file.

use std::io;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use routetrack::config::{config_file_path, file, TrackingConfig};

use super::common::load_config;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration in INI form
    Show {
        /// Config file to read instead of ~/.routetrack/config.ini
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a configuration file with default values
    Init {
        /// Where to write instead of ~/.routetrack/config.ini
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show { config } => run_show(config.as_deref()),
        ConfigCommands::Init { path, force } => {
            let path = path.unwrap_or_else(config_file_path);
            run_init(&path, force)
        }
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Print the effective configuration.
fn run_show(path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(path)?;
    file::to_ini(&config)
        .write_to(&mut io::stdout())
        .map_err(|e| CliError::Output(e.to_string()))
}

/// Write the default configuration.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::FileExists(path.to_path_buf()));
    }

    file::save_to(&TrackingConfig::default(), path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
