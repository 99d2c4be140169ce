//! Miner role loop (spec §4.7): a two-state machine
//! (`mining_allowed ∈ {false, true}`) driven by `CONTROL` messages for
//! this miner's shard.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{Result, SsamError};
use crate::miner::ShardMiner;
use crate::network::message::{ControlAction, Envelope};
use crate::network::transport::PeerTransport;

/// Fixed backoff after each mined-and-sent shard block (spec §4.7:
/// "sleep a small fixed backoff").
const POST_MINE_BACKOFF: Duration = Duration::from_millis(200);

pub struct MinerRole {
    pub miner: ShardMiner,
    pub shard: String,
    pub staker_peer: String,
    transport: Arc<PeerTransport>,
}

impl MinerRole {
    pub fn new(
        miner: ShardMiner,
        shard: impl Into<String>,
        staker_peer: impl Into<String>,
        transport: Arc<PeerTransport>,
    ) -> Self {
        Self {
            miner,
            shard: shard.into(),
            staker_peer: staker_peer.into(),
            transport,
        }
    }

    /// Runs the miner loop forever, consuming `control_rx`. Returns
    /// only on a transport or protocol error the caller should treat
    /// as unrecoverable.
    pub async fn run(&self, control_rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Result<()> {
        let mut mining_allowed = false;

        'outer: loop {
            let envelope = match control_rx.recv().await {
                Some(e) => e,
                None => {
                    log::info!("{}: control queue closed, stopping", self.miner.miner_node_name);
                    return Ok(());
                }
            };

            let control = match envelope.decode_control() {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("{}: dropping malformed CONTROL: {}", self.miner.miner_node_name, e);
                    continue;
                }
            };

            if control.shard != self.shard {
                continue;
            }

            match control.action {
                ControlAction::Start => mining_allowed = true,
                ControlAction::Stop => mining_allowed = false,
            }

            if !mining_allowed {
                continue;
            }

            log::info!(
                "{}: mining shard block for epoch {}",
                self.miner.miner_node_name, control.epoch
            );
            let block = loop {
                match self.miner.mine_shard_block() {
                    Ok(block) => break block,
                    Err(SsamError::Exhaustion) => {
                        log::warn!(
                            "{}: nonce space exhausted, retrying with a fresh timestamp",
                            self.miner.miner_node_name
                        );
                    }
                    Err(e) => {
                        log::warn!("{}: {}", self.miner.miner_node_name, e);
                        mining_allowed = false;
                        continue 'outer;
                    }
                }
            };

            let out = Envelope::shard_block(&self.miner.miner_node_name, &block)?;
            if let Err(e) = self.transport.send_message(&self.staker_peer, &out).await {
                log::warn!(
                    "{}: failed to send shard block to {}: {}",
                    self.miner.miner_node_name, self.staker_peer, e
                );
            }

            mining_allowed = false;
            tokio::time::sleep(POST_MINE_BACKOFF).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::ControlMessage;
    use crate::network::router::MessageRouter;
    use crate::pool::TransactionPool;

    fn transport_with_no_peers() -> Arc<PeerTransport> {
        Arc::new(PeerTransport::new("127.0.0.1:0", vec![]))
    }

    #[tokio::test]
    async fn control_for_other_shard_is_ignored() {
        let (router, mut queues) = MessageRouter::new();
        let pool = TransactionPool::new(vec![]);
        let miner = ShardMiner::new(0, "miner0", 1, &pool, "0x1f00ffff");
        let role = MinerRole::new(miner, "shard0", "staker0:5000", transport_with_no_peers());

        let other_shard = ControlMessage::start("shard1", 1);
        router.dispatch(Envelope::control("staker0", &other_shard).unwrap());

        // Send one message for a different shard, then drop the sender
        // side by dropping `router`; `recv` then returns None and
        // `run` exits cleanly, proving the START was never acted on
        // (it would otherwise hang trying to mine/send).
        drop(router);

        tokio::time::timeout(Duration::from_secs(2), role.run(&mut queues.control))
            .await
            .expect("loop should exit once the queue is closed")
            .unwrap();
    }
}
