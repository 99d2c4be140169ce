//! Staker-produced block aggregating one shard block per miner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::blockchain::shard_block::ShardBlock;
use crate::consensus::Minable;
use crate::transaction::Transaction;

/// Summary of one shard's contribution, keyed by miner node name in
/// the block's `shard_data`. Stored in a `BTreeMap` so the hash is
/// independent of the order shard blocks were collected in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShardSummary {
    pub block_hash: String,
    pub miner_numeric_id: u32,
    pub timestamp: String,
    pub merkle_root: String,
    pub nonce: u64,
    pub nbits: String,
}

impl From<&ShardBlock> for ShardSummary {
    fn from(sb: &ShardBlock) -> Self {
        Self {
            block_hash: sb.compute_hash(),
            miner_numeric_id: sb.miner_numeric_id,
            timestamp: sb.timestamp.clone(),
            merkle_root: sb.merkle_root.clone(),
            nonce: sb.nonce,
            nbits: sb.nbits.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MainBlock {
    pub index: u64,
    pub timestamp: String,
    pub previous_hash: String,
    pub tx_root: String,
    pub staker_signature: String,
    pub nbits: String,
    pub nonce: u64,
    pub shard_data: BTreeMap<String, ShardSummary>,
    pub transactions: Vec<Transaction>,
}

impl MainBlock {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        previous_hash: impl Into<String>,
        tx_root: impl Into<String>,
        staker_signature: impl Into<String>,
        nbits: impl Into<String>,
        nonce: u64,
        shard_data: BTreeMap<String, ShardSummary>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            timestamp: timestamp.into(),
            previous_hash: previous_hash.into(),
            tx_root: tx_root.into(),
            staker_signature: staker_signature.into(),
            nbits: nbits.into(),
            nonce,
            shard_data,
            transactions,
        }
    }

    /// SHA-256 of the canonical JSON of the hashed header fields
    /// (everything except `transactions`).
    pub fn compute_hash(&self) -> String {
        let shard_data_value = serde_json::to_value(&self.shard_data)
            .expect("shard summaries serialize to JSON");

        let mut fields = Map::new();
        fields.insert("index".to_string(), Value::from(self.index));
        fields.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.clone()),
        );
        fields.insert(
            "previous_hash".to_string(),
            Value::String(self.previous_hash.clone()),
        );
        fields.insert("tx_root".to_string(), Value::String(self.tx_root.clone()));
        fields.insert(
            "staker_signature".to_string(),
            Value::String(self.staker_signature.clone()),
        );
        fields.insert("nbits".to_string(), Value::String(self.nbits.clone()));
        fields.insert("nonce".to_string(), Value::from(self.nonce));
        fields.insert("shard_data".to_string(), shard_data_value);

        let encoded = crate::canonical::canonical_json(&Value::Object(fields));

        let mut hasher = Sha256::new();
        hasher.update(encoded.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Minable for MainBlock {
    fn nonce(&self) -> u64 {
        self.nonce
    }
    fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }
    fn nbits(&self) -> &str {
        &self.nbits
    }
    fn compute_hash(&self) -> String {
        MainBlock::compute_hash(self)
    }
}

/// The pinned genesis block: header fields and resulting hash are
/// fixed network parameters (spec §4.4, §9 Open Question #3, resolved
/// in DESIGN.md by following the original source's values exactly).
pub fn genesis_block() -> MainBlock {
    let genesis_tx = Transaction::new(
        "Network",
        "Public",
        0,
        "1734129936.8752465",
        serde_json::Map::new(),
    );

    MainBlock::new(
        0,
        "1734129936.8752465",
        "0",
        "1011a88e4e9231ad320625b235a22997ba68d99db47a808dcc059c07395082eb",
        "0x0",
        "0x1e0ffff0",
        820329,
        BTreeMap::new(),
        vec![genesis_tx],
    )
}

/// The pinned hash genesis must reproduce, per spec §4.4 I1.
pub const GENESIS_HASH: &str =
    "00000110b03f6bca0513e614094a7d3b42729bacc65d6ae99b7088f5eebe0f28";
