//! Genesis-anchored, append-only main chain.

use std::collections::HashMap;

use crate::blockchain::main_block::{genesis_block, MainBlock, GENESIS_HASH};

/// The global main chain: an ordered sequence of [`MainBlock`]s plus a
/// hash → block lookup table, owned by a single role loop (spec §5).
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<MainBlock>,
    by_hash: HashMap<String, MainBlock>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// A chain with the pinned genesis block pre-inserted.
    pub fn new() -> Self {
        let genesis = genesis_block();
        let hash = genesis.compute_hash();
        let mut by_hash = HashMap::new();
        by_hash.insert(hash, genesis.clone());
        Self {
            blocks: vec![genesis],
            by_hash,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn head(&self) -> &MainBlock {
        self.blocks.last().expect("chain always has at least genesis")
    }

    pub fn lookup(&self, hash: &str) -> Option<&MainBlock> {
        self.by_hash.get(hash)
    }

    pub fn blocks(&self) -> &[MainBlock] {
        &self.blocks
    }

    /// Genesis is valid iff `previous_hash == "0"` and its hash equals
    /// the pinned constant; every other block is valid iff its
    /// `previous_hash` resolves to a block whose own hash matches.
    pub fn is_valid(&self, block: &MainBlock) -> bool {
        if block.index == 0 {
            return block.previous_hash == "0" && block.compute_hash() == GENESIS_HASH;
        }
        match self.lookup(&block.previous_hash) {
            Some(previous) => block.previous_hash == previous.compute_hash(),
            None => false,
        }
    }

    pub fn is_chain_valid(&self) -> bool {
        self.blocks.iter().all(|b| self.is_valid(b))
    }

    /// Validates then appends. Returns `true` on success; the chain is
    /// unchanged on rejection.
    pub fn append(&mut self, block: MainBlock) -> bool {
        if !self.is_valid(&block) {
            return false;
        }
        let hash = block.compute_hash();
        self.by_hash.insert(hash, block.clone());
        self.blocks.push(block);
        true
    }

    /// Replaces the chain with `new_chain` if it is strictly longer
    /// **and** `self.is_chain_valid()` holds.
    ///
    /// This mirrors the original source's `replace_chain`, which
    /// checks the *current* chain's validity rather than the
    /// incoming one (spec §9 Open Question: "likely a bug"). It is
    /// kept here, explicitly, rather than silently fixed — callers
    /// that want the incoming chain checked should use
    /// [`Chain::replace_validated`] instead.
    pub fn replace(&mut self, new_chain: Vec<MainBlock>) -> bool {
        if new_chain.len() <= self.blocks.len() {
            return false;
        }
        if !self.is_chain_valid() {
            return false;
        }
        self.adopt(new_chain);
        true
    }

    /// Stricter variant that validates the **incoming** chain
    /// block-by-block before adopting it, in case the deployment wants
    /// the non-buggy behavior (spec §9 Open Question, the other
    /// explicit option).
    pub fn replace_validated(&mut self, new_chain: Vec<MainBlock>) -> bool {
        if new_chain.len() <= self.blocks.len() {
            return false;
        }
        let candidate = Chain {
            blocks: new_chain.clone(),
            by_hash: new_chain
                .iter()
                .map(|b| (b.compute_hash(), b.clone()))
                .collect(),
        };
        if !candidate.is_chain_valid() {
            return false;
        }
        self.adopt(new_chain);
        true
    }

    fn adopt(&mut self, new_chain: Vec<MainBlock>) {
        self.by_hash = new_chain
            .iter()
            .map(|b| (b.compute_hash(), b.clone()))
            .collect();
        self.blocks = new_chain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn genesis_chain_is_valid() {
        let chain = Chain::new();
        assert!(chain.is_chain_valid());
        assert_eq!(chain.len(), 1);
    }

    fn next_block(chain: &Chain) -> MainBlock {
        MainBlock::new(
            chain.len() as u64,
            "2",
            chain.head().compute_hash(),
            "root",
            "staker10:sig",
            "0x1f00ffff",
            0,
            BTreeMap::new(),
            vec![],
        )
    }

    #[test]
    fn append_accepts_correctly_chained_block() {
        let mut chain = Chain::new();
        let block = next_block(&chain);
        assert!(chain.append(block));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn append_rejects_wrong_previous_hash() {
        let mut chain = Chain::new();
        let mut block = next_block(&chain);
        block.previous_hash = "not-the-real-hash".to_string();
        assert!(!chain.append(block));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn append_rejects_wrong_index() {
        // index is not checked directly by is_valid, but a block whose
        // previous_hash doesn't match anything in the lookup table
        // (because it was built against a different chain state) is
        // still rejected.
        let mut chain = Chain::new();
        let mut block = next_block(&chain);
        block.index = 5;
        block.previous_hash = "bogus".to_string();
        assert!(!chain.append(block));
    }

    #[test]
    fn replace_requires_strictly_longer_chain() {
        let mut chain = Chain::new();
        let same_len = vec![chain.head().clone()];
        assert!(!chain.replace(same_len));
    }

    #[test]
    fn replace_validated_rejects_inconsistent_incoming_chain() {
        let mut chain = Chain::new();
        let bogus_second = MainBlock::new(
            1,
            "t",
            "not-genesis-hash".to_string(),
            "root",
            "sig",
            "0x1f00ffff",
            0,
            BTreeMap::new(),
            vec![],
        );
        let new_chain = vec![chain.head().clone(), bogus_second];
        assert!(!chain.replace_validated(new_chain));
    }

    #[test]
    fn replace_validated_accepts_consistent_longer_chain() {
        let mut chain = Chain::new();
        let second = next_block(&chain);
        let new_chain = vec![chain.head().clone(), second];
        assert!(chain.replace_validated(new_chain));
        assert_eq!(chain.len(), 2);
    }
}
