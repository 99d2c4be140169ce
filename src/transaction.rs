//! Canonical transaction record and its SHA-256 content hash.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A transfer of `amount` from `sender` to `recipient`, carrying
/// arbitrary `metadata` and an optional content-hash `signature`.
///
/// `signature` is not a cryptographic signature (spec §1 Non-goals: no
/// transaction signature verification) — it is a self-hash stamped by
/// [`Transaction::hash_transaction`], matching the glossary's "Staker
/// signature" naming convention of identifying-but-not-authenticating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
    pub timestamp: String,
    pub metadata: Map<String, Value>,
    pub signature: Option<String>,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: i64,
        timestamp: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp: timestamp.into(),
            metadata,
            signature: None,
        }
    }

    /// Canonical JSON of the record with `signature` forced to null and
    /// keys in sorted order (serde_json's default `Map` is a `BTreeMap`,
    /// so this falls out of serialization rather than needing a
    /// separate canonicalization pass).
    fn canonical_json(&self) -> String {
        let mut fields = Map::new();
        fields.insert("sender".to_string(), Value::String(self.sender.clone()));
        fields.insert(
            "recipient".to_string(),
            Value::String(self.recipient.clone()),
        );
        fields.insert("amount".to_string(), Value::from(self.amount));
        fields.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.clone()),
        );
        fields.insert(
            "metadata".to_string(),
            Value::Object(self.metadata.clone()),
        );
        fields.insert("signature".to_string(), Value::Null);
        crate::canonical::canonical_json(&Value::Object(fields))
    }

    /// SHA-256 hex digest of the canonical record. Two transactions
    /// that differ only in `signature` hash identically.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_json().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Stamps `signature` with the transaction's own content hash.
    pub fn hash_transaction(&mut self) {
        self.signature = Some(self.calculate_hash());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(signature: Option<&str>) -> Transaction {
        let mut tx = Transaction::new("alice", "bob", 100, "1700000000", Map::new());
        tx.signature = signature.map(str::to_string);
        tx
    }

    #[test]
    fn hash_ignores_signature() {
        let unsigned = sample(None);
        let signed = sample(Some("deadbeef"));
        assert_eq!(unsigned.calculate_hash(), signed.calculate_hash());
    }

    #[test]
    fn hash_transaction_stamps_self_hash() {
        let mut tx = sample(None);
        let expected = tx.calculate_hash();
        tx.hash_transaction();
        assert_eq!(tx.signature, Some(expected));
    }

    #[test]
    fn differing_fields_hash_differently() {
        let a = Transaction::new("alice", "bob", 100, "1700000000", Map::new());
        let b = Transaction::new("alice", "bob", 101, "1700000000", Map::new());
        assert_ne!(a.calculate_hash(), b.calculate_hash());
    }
}
