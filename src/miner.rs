//! Shard miner: mines one [`ShardBlock`] over a fixed partition of the
//! transaction pool (spec §4.2).

use crate::blockchain::shard_block::ShardBlock;
use crate::consensus::find_valid_nonce;
use crate::error::{Result, SsamError};
use crate::merkle::merkle_root;
use crate::pool::TransactionPool;
use crate::timestamp;
use crate::transaction::Transaction;

/// One miner's assignment within its shard: `assigned = { tx[i] | i mod
/// num_miners == miner_numeric_id }`, fixed at construction.
pub struct ShardMiner {
    pub miner_numeric_id: u32,
    pub miner_node_name: String,
    pub nbits: String,
    assigned: Vec<Transaction>,
}

impl ShardMiner {
    pub fn new(
        miner_numeric_id: u32,
        miner_node_name: impl Into<String>,
        num_miners: u32,
        pool: &TransactionPool,
        nbits: impl Into<String>,
    ) -> Self {
        let assigned = pool.transactions_for_miner(miner_numeric_id, num_miners);
        Self {
            miner_numeric_id,
            miner_node_name: miner_node_name.into(),
            nbits: nbits.into(),
            assigned,
        }
    }

    pub fn assigned_transactions(&self) -> &[Transaction] {
        &self.assigned
    }

    /// Builds a [`ShardBlock`] over the miner's assignment and runs the
    /// nonce search to completion. An empty assignment still produces a
    /// block (with `merkle_root = ""`) and still runs the PoW search
    /// over the header (spec §4.2 edge case).
    ///
    /// Returns [`SsamError::Exhaustion`] if the nonce space is
    /// exhausted; per spec §7 the caller should retry with a fresh
    /// timestamp.
    pub fn mine_shard_block(&self) -> Result<ShardBlock> {
        let merkle = merkle_root(self.assigned.iter().map(|tx| tx.calculate_hash()));

        let mut block = ShardBlock::new(
            self.miner_numeric_id,
            self.miner_node_name.clone(),
            timestamp::now(),
            merkle,
            self.nbits.clone(),
            self.assigned.clone(),
        );

        match find_valid_nonce(&mut block)? {
            Some(_) => Ok(block),
            None => Err(SsamError::Exhaustion),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn pool_of(n: i64) -> TransactionPool {
        TransactionPool::new(
            (0..n)
                .map(|i| Transaction::new("s", "r", i, "t", Map::new()))
                .collect(),
        )
    }

    #[test]
    fn empty_assignment_still_mines() {
        let pool = pool_of(0);
        let miner = ShardMiner::new(0, "miner0", 2, &pool, "0x1f00ffff");
        let block = miner.mine_shard_block().unwrap();
        assert_eq!(block.merkle_root, "");
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn mined_block_carries_only_assigned_transactions() {
        let pool = pool_of(6);
        let miner = ShardMiner::new(1, "miner1", 3, &pool, "0x1f00ffff");
        let block = miner.mine_shard_block().unwrap();
        let amounts: Vec<i64> = block.transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![1, 4]);
    }

    #[test]
    fn mined_block_satisfies_its_own_proof() {
        use crate::consensus::{is_valid_proof, nbits_to_target};
        let pool = pool_of(2);
        let miner = ShardMiner::new(0, "miner0", 1, &pool, "0x1f00ffff");
        let block = miner.mine_shard_block().unwrap();
        let target = nbits_to_target(&block.nbits).unwrap();
        assert!(is_valid_proof(&block, &target).unwrap());
    }
}
