//! Node configuration: JSON file schema (spec §6) plus the shard/staker
//! lookup helpers the node orchestrator and role loops need.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SsamError};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    pub nbits: String,
}

/// One shard's miner set, keyed by shard name in [`Config::shard_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardEntry {
    pub peers: Vec<String>,
    pub num_miners: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network_config: NetworkConfig,
    pub mining_config: MiningConfig,
    pub shard_config: BTreeMap<String, ShardEntry>,
    pub stake_info: HashMap<String, u64>,
}

impl Config {
    /// Loads and validates the JSON file at `path`. Every top-level key
    /// is required (spec §6: "Loader must reject missing keys").
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)?;
        let object = raw.as_object().ok_or_else(|| {
            SsamError::Configuration("config root must be a JSON object".to_string())
        })?;

        for key in ["network_config", "mining_config", "shard_config", "stake_info"] {
            if !object.contains_key(key) {
                return Err(SsamError::Configuration(format!(
                    "missing required config key '{}'",
                    key
                )));
            }
        }

        let config: Config = serde_json::from_value(raw)
            .map_err(|e| SsamError::Configuration(format!("malformed config: {}", e)))?;

        if config.shard_config.is_empty() {
            return Err(SsamError::Configuration(
                "shard_config must name at least one shard".to_string(),
            ));
        }

        Ok(config)
    }

    /// All configured peer addresses of `shard` (miners and its staker).
    pub fn peers_for_shard(&self, shard: &str) -> Option<&[String]> {
        self.shard_config.get(shard).map(|s| s.peers.as_slice())
    }

    pub fn num_miners_in_shard(&self, shard: &str) -> Option<u32> {
        self.shard_config.get(shard).map(|s| s.num_miners)
    }

    /// The staker address for `shard`: the one peer in that shard's
    /// list whose `host:port` string contains `"staker"`.
    pub fn staker_for_shard(&self, shard: &str) -> Option<&str> {
        self.peers_for_shard(shard)?
            .iter()
            .find(|peer| peer.contains("staker"))
            .map(String::as_str)
    }

    /// Every peer in `network_config.peers` that names a staker other
    /// than `me`.
    pub fn other_stakers(&self, me: &str) -> Vec<String> {
        self.network_config
            .peers
            .iter()
            .filter(|peer| peer.contains("staker") && !peer.starts_with(me))
            .cloned()
            .collect()
    }

    pub fn stake_table(&self) -> HashMap<String, u64> {
        self.stake_info.clone()
    }
}
