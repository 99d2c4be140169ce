//! Shard staker: stake table, deterministic election, block aggregation
//! (spec §4.3).

use std::collections::{BTreeMap, HashMap};

use num_bigint::BigUint;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::blockchain::chain::Chain;
use crate::blockchain::main_block::{MainBlock, ShardSummary};
use crate::blockchain::shard_block::ShardBlock;
use crate::merkle::merkle_root;
use crate::network::message::{ContentType, Envelope};
use crate::timestamp;

/// A staker's signature: `<node_name>:<random-128-bit-hex>`, generated
/// once per process (spec §4.3, glossary "Staker signature"). It
/// identifies the proposer; it is not a cryptographic signature.
pub fn generate_signature(node_name: &str) -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}:{}", node_name, hex::encode(bytes))
}

/// Stake table, election, shard-block validation, and main-block
/// proposal/receipt for one staker's shard.
pub struct Staker {
    pub node_name: String,
    pub signature: String,
    stakes: HashMap<String, u64>,
}

impl Staker {
    pub fn new(node_name: impl Into<String>) -> Self {
        let node_name = node_name.into();
        let signature = generate_signature(&node_name);
        Self {
            node_name,
            signature,
            stakes: HashMap::new(),
        }
    }

    /// Replaces the stake table wholesale.
    pub fn initialize_stakes(&mut self, stakes: HashMap<String, u64>) {
        self.stakes = stakes;
    }

    /// Sets `amount` for a new staker id, or adds to its existing stake.
    pub fn add_stake(&mut self, id: impl Into<String>, amount: u64) {
        *self.stakes.entry(id.into()).or_insert(0) += amount;
    }

    pub fn stakes(&self) -> &HashMap<String, u64> {
        &self.stakes
    }

    /// Deterministic, stake-weighted staker selection for the next
    /// epoch (`head.index + 1`), keyed off the current chain head's
    /// hash. Returns `None` if the stake table is empty or sums to
    /// zero (spec §4.3).
    pub fn select_staker(&self, chain: &Chain) -> Option<(String, u64)> {
        let total: u64 = self.stakes.values().sum();
        if total == 0 {
            return None;
        }

        let head = chain.head();
        let head_hash = head.compute_hash();
        let epoch = head.index + 1;

        let mut sorted_ids: Vec<&String> = self.stakes.keys().collect();
        sorted_ids.sort();

        let mut hasher = Sha256::new();
        hasher.update(head_hash.as_bytes());
        for id in &sorted_ids {
            hasher.update(id.as_bytes());
        }
        let draw = BigUint::from_bytes_be(&hasher.finalize());
        let draw_mod_total = draw % BigUint::from(total);

        let mut cumulative: u64 = 0;
        for id in sorted_ids {
            cumulative += self.stakes[id];
            if draw_mod_total < BigUint::from(cumulative) {
                return Some((id.clone(), epoch));
            }
        }
        unreachable!("cumulative stake reaches total before the loop ends")
    }

    /// Recomputes the Merkle root over `sb.transactions` and compares
    /// it to the block's claimed `merkle_root`. PoW validity of a
    /// shard block is deliberately not checked here (spec §4.3: "not
    /// required by the core staker protocol").
    pub fn validate_shard_block(&self, sb: &ShardBlock) -> bool {
        let recomputed = merkle_root(sb.transactions.iter().map(|tx| tx.calculate_hash()));
        recomputed == sb.merkle_root
    }

    /// Aggregates one shard block per miner into a new [`MainBlock`]
    /// and appends it to `chain`. Returns `(accepted, block)`; on
    /// rejection the returned block was not adopted by `chain`.
    pub fn propose_main_block(
        &self,
        chain: &mut Chain,
        nbits: &str,
        shard_blocks: &[ShardBlock],
    ) -> (bool, MainBlock) {
        let combined: Vec<_> = shard_blocks
            .iter()
            .flat_map(|sb| sb.transactions.clone())
            .collect();
        let tx_root = merkle_root(combined.iter().map(|tx| tx.calculate_hash()));

        let shard_data: BTreeMap<String, ShardSummary> = shard_blocks
            .iter()
            .map(|sb| (sb.miner_node_name.clone(), ShardSummary::from(sb)))
            .collect();

        let block = MainBlock::new(
            chain.len() as u64,
            timestamp::now(),
            chain.head().compute_hash(),
            tx_root,
            self.signature.clone(),
            nbits,
            0,
            shard_data,
            combined,
        );

        let accepted = chain.append(block.clone());
        (accepted, block)
    }

    /// Decodes a `MAIN_BLOCK` envelope and appends it if it passes
    /// chain validation. The envelope's embedded `block_hash` is
    /// ignored; only `chain.is_valid`/`append` decide acceptance
    /// (spec §6: "the receiver recomputes the hash").
    pub fn receive_main_block(
        &self,
        chain: &mut Chain,
        envelope: &Envelope,
    ) -> Option<(bool, MainBlock)> {
        if envelope.content_type != ContentType::MainBlock {
            return None;
        }
        let block = envelope.decode_main_block().ok()?;
        let accepted = chain.append(block.clone());
        Some((accepted, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use serde_json::Map;

    fn staker_with(stakes: &[(&str, u64)]) -> Staker {
        let mut staker = Staker::new("staker0");
        staker.initialize_stakes(stakes.iter().map(|(k, v)| (k.to_string(), *v)).collect());
        staker
    }

    #[test]
    fn empty_stake_table_selects_nobody() {
        let staker = Staker::new("staker0");
        let chain = Chain::new();
        assert!(staker.select_staker(&chain).is_none());
    }

    #[test]
    fn zero_sum_stake_table_selects_nobody() {
        let staker = staker_with(&[("staker0", 0), ("staker1", 0)]);
        let chain = Chain::new();
        assert!(staker.select_staker(&chain).is_none());
    }

    #[test]
    fn selection_is_deterministic_across_instances() {
        let a = staker_with(&[("staker10", 40), ("staker20", 25), ("staker30", 20)]);
        let b = staker_with(&[("staker10", 40), ("staker20", 25), ("staker30", 20)]);
        let chain = Chain::new();
        assert_eq!(a.select_staker(&chain), b.select_staker(&chain));
    }

    #[test]
    fn selection_epoch_is_head_index_plus_one() {
        let staker = staker_with(&[("staker10", 1)]);
        let chain = Chain::new();
        let (_, epoch) = staker.select_staker(&chain).unwrap();
        assert_eq!(epoch, chain.head().index + 1);
    }

    fn tx(n: i64) -> Transaction {
        Transaction::new("s", "r", n, "t", Map::new())
    }

    #[test]
    fn validate_shard_block_checks_merkle_root() {
        let staker = Staker::new("staker0");
        let txs = vec![tx(1), tx(2)];
        let root = merkle_root(txs.iter().map(|t| t.calculate_hash()));
        let good = ShardBlock::new(0, "miner0", "1", root, "0x1f00ffff", txs.clone());
        assert!(staker.validate_shard_block(&good));

        let bad = ShardBlock::new(0, "miner0", "1", "wrong-root", "0x1f00ffff", txs);
        assert!(!staker.validate_shard_block(&bad));
    }

    #[test]
    fn propose_main_block_aggregates_in_call_order_and_names_each_miner() {
        let staker = Staker::new("staker0");
        let mut chain = Chain::new();

        let txs0 = vec![tx(1)];
        let txs1 = vec![tx(2), tx(3)];
        let root0 = merkle_root(txs0.iter().map(|t| t.calculate_hash()));
        let root1 = merkle_root(txs1.iter().map(|t| t.calculate_hash()));
        let sb0 = ShardBlock::new(0, "miner0", "1", root0, "0x1f00ffff", txs0.clone());
        let sb1 = ShardBlock::new(1, "miner1", "1", root1, "0x1f00ffff", txs1.clone());

        let (accepted, block) =
            staker.propose_main_block(&mut chain, "0x1f00ffff", &[sb0, sb1]);
        assert!(accepted);

        let combined: Vec<_> = txs0.into_iter().chain(txs1).collect();
        let expected_root = merkle_root(combined.iter().map(|t| t.calculate_hash()));
        assert_eq!(block.tx_root, expected_root);
        assert_eq!(block.shard_data.len(), 2);
        assert!(block.shard_data.contains_key("miner0"));
        assert!(block.shard_data.contains_key("miner1"));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn receive_main_block_rejects_non_main_block_envelope() {
        let staker = Staker::new("staker0");
        let mut chain = Chain::new();
        let control = crate::network::message::ControlMessage::start("shard0", 1);
        let envelope = Envelope::control("staker1", &control).unwrap();
        assert!(staker.receive_main_block(&mut chain, &envelope).is_none());
    }

    #[test]
    fn receive_main_block_appends_valid_block() {
        let sender = Staker::new("staker0");
        let mut sender_chain = Chain::new();
        let (_, block) = sender.propose_main_block(&mut sender_chain, "0x1f00ffff", &[]);
        let envelope = Envelope::main_block("staker0", &block).unwrap();

        let receiver = Staker::new("staker1");
        let mut receiver_chain = Chain::new();
        let (accepted, _) = receiver
            .receive_main_block(&mut receiver_chain, &envelope)
            .unwrap();
        assert!(accepted);
        assert_eq!(receiver_chain.head().compute_hash(), sender_chain.head().compute_hash());
    }
}
