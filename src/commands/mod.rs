pub mod batch;
pub mod calendar;
pub mod contact;
pub mod container;
pub mod export;
pub mod hash;
pub mod init;

use anyhow::Result;
use pimbridge_core::config::BridgeConfig;
use pimbridge_core::store::LocalStore;

/// Load the config and open the store it points at.
pub fn open_store() -> Result<(BridgeConfig, LocalStore)> {
    let config = BridgeConfig::load()?;
    let store = LocalStore::open(config.store_path()?)?;
    tracing::debug!(root = %store.root().display(), "opened store");
    Ok((config, store))
}
