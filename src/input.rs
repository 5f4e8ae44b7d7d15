use std::io::Read;

use anyhow::Result;
use pimbridge_core::error::BridgeError;
use serde::de::DeserializeOwned;

/// Read JSON from a file, or from stdin when `source` is "-".
pub fn read_json<T: DeserializeOwned>(source: &str) -> Result<T> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(BridgeError::from)?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(BridgeError::from)?
    };

    serde_json::from_str(&content)
        .map_err(|e| BridgeError::invalid("input", e.to_string()).into())
}
