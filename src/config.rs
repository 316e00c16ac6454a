//! Configuration for the identity server.

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// CLI arguments for the identity server.
#[derive(Parser, Debug)]
#[command(name = "idt-server")]
#[command(about = "Identity reputation HTTP server")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Server configuration.
///
/// Fields use serde defaults that fall back to environment variables, then
/// to hardcoded defaults, so the server runs with no config file at all.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    /// Bootstrap file with the initial admin identities.
    #[serde(default = "config_defaults::default_admins_file")]
    admins_file: PathBuf,
    /// Bootstrap file with the initial moderator identities.
    #[serde(default = "config_defaults::default_moderators_file")]
    moderators_file: PathBuf,
    /// Bootstrap file with genesis balances.
    #[serde(default = "config_defaults::default_genesis_file")]
    genesis_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: config_defaults::default_port(),
            host: config_defaults::default_host(),
            admins_file: config_defaults::default_admins_file(),
            moderators_file: config_defaults::default_moderators_file(),
            genesis_file: config_defaults::default_genesis_file(),
        }
    }
}

pub mod config_defaults {
    use std::env;
    use std::net::IpAddr;
    use std::path::PathBuf;

    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Returns the default port value with fallback: $PORT env var -> 8000
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: $HOST env var -> "0.0.0.0"
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(DEFAULT_HOST.parse().unwrap()))
    }

    pub fn default_admins_file() -> PathBuf {
        PathBuf::from("admins.json")
    }

    pub fn default_moderators_file() -> PathBuf {
        PathBuf::from("moderators.json")
    }

    pub fn default_genesis_file() -> PathBuf {
        PathBuf::from("genesis.json")
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn admins_file(&self) -> &Path {
        &self.admins_file
    }

    pub fn moderators_file(&self) -> &Path {
        &self.moderators_file
    }

    pub fn genesis_file(&self) -> &Path {
        &self.genesis_file
    }

    /// Load configuration from CLI arguments and JSON file.
    ///
    /// The config file path comes from `--config <path>` (or `$CONFIG`),
    /// defaulting to `./config.json`. A missing file is not an error: every
    /// value resolves via environment variables or defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::load_from_path(cli_args.config)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_every_field() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.host().to_string(), "0.0.0.0");
        assert_eq!(config.admins_file(), Path::new("admins.json"));
        assert_eq!(config.moderators_file(), Path::new("moderators.json"));
        assert_eq!(config.genesis_file(), Path::new("genesis.json"));
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"port": 9001, "host": "127.0.0.1", "genesis_file": "state/genesis.json"}"#,
        )
        .unwrap();
        assert_eq!(config.port(), 9001);
        assert_eq!(config.host().to_string(), "127.0.0.1");
        assert_eq!(config.genesis_file(), Path::new("state/genesis.json"));
    }
}
