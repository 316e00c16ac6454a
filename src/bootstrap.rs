//! Startup ingestion of bootstrap state files.
//!
//! Three optional files are read once at startup: `admins.json` and
//! `moderators.json` (JSON arrays of base58 identities, inserted into the
//! role sets unconditionally) and `genesis.json` (an array of
//! `{ "user", "idt" }` records written as proof records with the reserved
//! genesis proof id, bypassing the proof-balance bound). A missing file is
//! skipped; a present-but-malformed file is a startup error.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::identity::Identity;
use crate::service::{ApiError, IdentityService};

/// One genesis balance record.
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisEntry {
    pub user: Identity,
    pub idt: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to read bootstrap file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse bootstrap file at {0}: {1}")]
    JsonParse(PathBuf, serde_json::Error),
    #[error("Failed to ingest bootstrap state: {0}")]
    Ingest(#[from] ApiError),
}

/// Loads whichever bootstrap files exist and feeds them into the service.
pub fn load_state_files(service: &IdentityService, config: &Config) -> Result<(), BootstrapError> {
    if let Some(admins) = read_if_present::<Vec<Identity>>(config.admins_file())? {
        tracing::info!(count = admins.len(), "loading bootstrap admins");
        for admin in admins {
            service.bootstrap_admin(admin)?;
        }
    }
    if let Some(moderators) = read_if_present::<Vec<Identity>>(config.moderators_file())? {
        tracing::info!(count = moderators.len(), "loading bootstrap moderators");
        for moderator in moderators {
            service.bootstrap_moderator(moderator)?;
        }
    }
    if let Some(genesis) = read_if_present::<Vec<GenesisEntry>>(config.genesis_file())? {
        tracing::info!(count = genesis.len(), "loading genesis balances");
        for entry in genesis {
            service.bootstrap_genesis(entry.user, entry.idt)?;
        }
    }
    Ok(())
}

fn read_if_present<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, BootstrapError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| BootstrapError::FileRead(path.to_path_buf(), e))?;
    let parsed = serde_json::from_str(&content)
        .map_err(|e| BootstrapError::JsonParse(path.to_path_buf(), e))?;
    Ok(Some(parsed))
}
