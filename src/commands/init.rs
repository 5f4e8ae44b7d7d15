use anyhow::Result;
use pimbridge_core::config::BridgeConfig;
use pimbridge_core::store::LocalStore;
use serde_json::{Value, json};

pub fn run() -> Result<Value> {
    let config_path = BridgeConfig::config_path()?;

    let created = !config_path.exists();
    if created {
        BridgeConfig::create_default_config(&config_path)?;
    }

    let config = BridgeConfig::load_from(&config_path)?;
    let store = LocalStore::open(config.store_path()?)?;

    Ok(json!({
        "config": config_path.display().to_string(),
        "store": store.root().display().to_string(),
        "created": created,
    }))
}
