//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// IDHub correlation-token service
#[derive(Debug, Parser)]
#[command(name = "idhub-server", version, about)]
pub struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(short, long, env = "IDHUB_CONFIG", default_value = "cfg.json")]
    pub config: PathBuf,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the log filter (e.g. `debug`, `idhub_server=trace`)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut crate::config::IdhubConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
