//! Miner-produced block over one miner's partition of the pool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::consensus::Minable;
use crate::transaction::Transaction;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShardBlock {
    pub miner_numeric_id: u32,
    pub miner_node_name: String,
    pub timestamp: String,
    pub merkle_root: String,
    pub nonce: u64,
    pub nbits: String,
    pub transactions: Vec<Transaction>,
}

impl ShardBlock {
    pub fn new(
        miner_numeric_id: u32,
        miner_node_name: impl Into<String>,
        timestamp: impl Into<String>,
        merkle_root: impl Into<String>,
        nbits: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            miner_numeric_id,
            miner_node_name: miner_node_name.into(),
            timestamp: timestamp.into(),
            merkle_root: merkle_root.into(),
            nonce: 0,
            nbits: nbits.into(),
            transactions,
        }
    }

    /// SHA-256 of the canonical JSON of the hashed header fields. The
    /// `transactions` payload is carried alongside but is not part of
    /// the hash.
    pub fn compute_hash(&self) -> String {
        let mut fields = Map::new();
        fields.insert(
            "miner_numeric_id".to_string(),
            Value::from(self.miner_numeric_id),
        );
        fields.insert(
            "miner_node_name".to_string(),
            Value::String(self.miner_node_name.clone()),
        );
        fields.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.clone()),
        );
        fields.insert(
            "merkle_root".to_string(),
            Value::String(self.merkle_root.clone()),
        );
        fields.insert("nonce".to_string(), Value::from(self.nonce));
        fields.insert("nbits".to_string(), Value::String(self.nbits.clone()));
        let encoded = crate::canonical::canonical_json(&Value::Object(fields));

        let mut hasher = Sha256::new();
        hasher.update(encoded.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Minable for ShardBlock {
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
        ShardBlock::compute_hash(self)
    }
}
