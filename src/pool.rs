//! Insertion-ordered transaction pool and its per-miner partition.

use crate::transaction::Transaction;

/// An insertion-ordered, read-only-after-load sequence of transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions owned by miner `miner` of `num_miners` total miners:
    /// index `i` belongs to miner `i mod num_miners`, in pool order.
    ///
    /// The partition is total and disjoint (spec §3 P3): the union over
    /// `miner in 0..num_miners` reconstructs the pool order exactly once.
    pub fn transactions_for_miner(&self, miner: u32, num_miners: u32) -> Vec<Transaction> {
        assert!(num_miners > 0, "num_miners must be at least 1");
        self.transactions
            .iter()
            .enumerate()
            .filter(|(i, _)| (*i as u32) % num_miners == miner)
            .map(|(_, tx)| tx.clone())
            .collect()
    }
}
