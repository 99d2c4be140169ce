//! Node orchestrator (spec §4.9): resolves role from `NODE_NAME` /
//! `SHARD`, wires transport + router + role state, and supervises the
//! role loop.

use std::sync::Arc;

use crate::blockchain::chain::Chain;
use crate::config::Config;
use crate::consensus::default_nbits;
use crate::error::{Result, SsamError};
use crate::miner::ShardMiner;
use crate::network::router::MessageRouter;
use crate::network::transport::PeerTransport;
use crate::persistence::ChainSnapshot;
use crate::pool::TransactionPool;
use crate::roles::{MinerRole, StakerRole};
use crate::staker::Staker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Miner,
    Staker,
}

/// Resolves a role from `NODE_NAME` (spec §6: `miner*` → miner,
/// `staker*` → staker).
pub fn role_from_node_name(node_name: &str) -> Result<Role> {
    if node_name.starts_with("miner") {
        Ok(Role::Miner)
    } else if node_name.starts_with("staker") {
        Ok(Role::Staker)
    } else {
        Err(SsamError::Configuration(format!(
            "NODE_NAME '{}' must start with 'miner' or 'staker'",
            node_name
        )))
    }
}

pub struct Node {
    pub node_name: String,
    pub shard: String,
    config: Config,
    transport: Arc<PeerTransport>,
    data_dir: Option<std::path::PathBuf>,
}

impl Node {
    pub fn new(
        node_name: impl Into<String>,
        shard: impl Into<String>,
        config: Config,
        listen_addr: impl Into<String>,
        data_dir: Option<std::path::PathBuf>,
    ) -> Self {
        let peers = config.network_config.peers.clone();
        Self {
            node_name: node_name.into(),
            shard: shard.into(),
            config,
            transport: Arc::new(PeerTransport::new(listen_addr, peers)),
            data_dir,
        }
    }

    /// Starts the transport, determines the role, and runs the
    /// corresponding role loop until it returns (spec §4.9; the
    /// transport is closed on every exit path).
    pub async fn run(self) -> Result<()> {
        let role = role_from_node_name(&self.node_name)?;

        let (router, mut queues) = MessageRouter::new();
        let router = Arc::new(router);
        self.transport.start(router).await?;

        let result = match role {
            Role::Miner => {
                let pool = drain_pending_transactions(&mut queues.transaction);
                self.run_miner(pool, &mut queues.control).await
            }
            Role::Staker => self.run_staker(&mut queues).await,
        };

        self.transport.stop().await;
        result
    }

    async fn run_miner(
        &self,
        pool: TransactionPool,
        control_rx: &mut tokio::sync::mpsc::UnboundedReceiver<crate::network::message::Envelope>,
    ) -> Result<()> {
        let num_miners = self
            .config
            .num_miners_in_shard(&self.shard)
            .ok_or_else(|| SsamError::Configuration(format!("unknown shard '{}'", self.shard)))?;
        let staker_peer = self
            .config
            .staker_for_shard(&self.shard)
            .ok_or_else(|| {
                SsamError::Configuration(format!("shard '{}' has no staker peer", self.shard))
            })?
            .to_string();

        let miner_numeric_id = miner_index(&self.node_name, &self.config, &self.shard)?;
        let miner = ShardMiner::new(
            miner_numeric_id,
            self.node_name.clone(),
            num_miners,
            &pool,
            nbits_or_default(&self.config),
        );

        let role = MinerRole::new(miner, self.shard.clone(), staker_peer, Arc::clone(&self.transport));
        role.run(control_rx).await
    }

    async fn run_staker(&self, queues: &mut crate::network::router::MessageQueues) -> Result<()> {
        let miner_peers: Vec<String> = self
            .config
            .peers_for_shard(&self.shard)
            .map(|peers| {
                peers
                    .iter()
                    .filter(|p| !p.contains("staker"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let other_stakers = self.config.other_stakers(&self.node_name);

        let mut staker = Staker::new(self.node_name.clone());
        staker.initialize_stakes(self.config.stake_table());

        let snapshot = self
            .data_dir
            .as_ref()
            .map(|dir| ChainSnapshot::new(dir, &self.node_name));

        let mut role = StakerRole::new(
            staker,
            Chain::new(),
            self.shard.clone(),
            nbits_or_default(&self.config),
            miner_peers,
            other_stakers,
            Arc::clone(&self.transport),
            snapshot,
        );
        role.run(queues).await
    }
}

/// A miner's numeric id within its shard is its position among the
/// shard's non-staker peers whose address contains its own node name.
fn miner_index(node_name: &str, config: &Config, shard: &str) -> Result<u32> {
    let peers = config
        .peers_for_shard(shard)
        .ok_or_else(|| SsamError::Configuration(format!("unknown shard '{}'", shard)))?;
    peers
        .iter()
        .filter(|p| !p.contains("staker"))
        .position(|p| p.contains(node_name))
        .map(|i| i as u32)
        .ok_or_else(|| {
            SsamError::Configuration(format!(
                "node '{}' not found among shard '{}' miner peers",
                node_name, shard
            ))
        })
}

/// Drains whatever `TRANSACTION` messages have already arrived into a
/// pool, in arrival order. The core spec treats the pool as
/// "read-only after load" (§5) without specifying where the load
/// comes from for a networked node; DESIGN.md records this choice
/// (one-shot drain at startup, matching the miner's "assignment fixed
/// at construction" invariant in §4.2) rather than re-partitioning on
/// every epoch.
fn drain_pending_transactions(
    transaction_rx: &mut tokio::sync::mpsc::UnboundedReceiver<crate::network::message::Envelope>,
) -> TransactionPool {
    let mut transactions = Vec::new();
    while let Ok(envelope) = transaction_rx.try_recv() {
        match envelope.decode_transaction() {
            Ok(tx) => transactions.push(tx),
            Err(e) => log::warn!("dropping malformed TRANSACTION message: {}", e),
        }
    }
    TransactionPool::new(transactions)
}

/// Default `nbits` used when the configuration does not specify one
/// (spec §4.1 default target).
pub fn nbits_or_default(config: &Config) -> String {
    if config.mining_config.nbits.is_empty() {
        default_nbits()
    } else {
        config.mining_config.nbits.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_node_name_dispatches_on_prefix() {
        assert_eq!(role_from_node_name("miner0").unwrap(), Role::Miner);
        assert_eq!(role_from_node_name("staker0").unwrap(), Role::Staker);
        assert!(role_from_node_name("watcher0").is_err());
    }

    fn sample_config() -> Config {
        Config::from_str(
            r#"{
                "network_config": { "peers": ["staker0:5000", "staker1:5000"] },
                "mining_config": { "nbits": "0x1f00ffff" },
                "shard_config": {
                    "shard0": {
                        "peers": ["miner0:5001", "miner1:5002", "staker0:5000"],
                        "num_miners": 2
                    }
                },
                "stake_info": { "staker0": 10, "staker1": 5 }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn miner_index_matches_position_among_shard_miner_peers() {
        let config = sample_config();
        assert_eq!(miner_index("miner0", &config, "shard0").unwrap(), 0);
        assert_eq!(miner_index("miner1", &config, "shard0").unwrap(), 1);
        assert!(miner_index("miner9", &config, "shard0").is_err());
    }
}
