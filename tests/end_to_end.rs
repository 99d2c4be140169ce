//! End-to-end scenarios S1-S6 from spec §8, exercised against the
//! public crate API rather than internals.

use std::collections::HashMap;

use serde_json::Map;
use ssam_chain::blockchain::chain::Chain;
use ssam_chain::blockchain::shard_block::ShardBlock;
use ssam_chain::consensus::{
    default_target, find_valid_nonce, is_valid_proof, nbits_to_target, target_to_nbits,
};
use ssam_chain::merkle::merkle_root;
use ssam_chain::staker::Staker;
use ssam_chain::transaction::Transaction;

/// S1: nBits round-trip against the pinned default target.
#[test]
fn s1_nbits_round_trip() {
    let target = default_target();
    let nbits = target_to_nbits(&target);
    assert_eq!(nbits, "0x1e0ffff0");
    assert_eq!(nbits_to_target(&nbits).unwrap(), target);
}

/// S2: trivial mining finds a nonce within MAX_NONCE and the header
/// hash satisfies the target comparison with at least one leading
/// zero nibble.
#[test]
fn s2_trivial_mining() {
    let tx = Transaction::new("alice", "bob", 1, "1", Map::new());
    let root = merkle_root(vec![tx.calculate_hash()]);
    let mut block = ShardBlock::new(0, "miner0", "1", root, "0x1f00ffff", vec![tx]);

    let nonce = find_valid_nonce(&mut block)
        .unwrap()
        .expect("a nonce should be found well within MAX_NONCE");
    assert_eq!(block.nonce, nonce);

    let hash = block.compute_hash();
    assert!(hash.starts_with('0'));

    let target = nbits_to_target("0x1f00ffff").unwrap();
    assert!(is_valid_proof(&block, &target).unwrap());
}

/// S3: genesis acceptance and a valid second block.
#[test]
fn s3_genesis_and_second_block() {
    let mut chain = Chain::new();
    assert!(chain.is_chain_valid());

    let second = ssam_chain::blockchain::main_block::MainBlock::new(
        1,
        "2",
        chain.head().compute_hash(),
        "root",
        "staker10:sig",
        "0x1f00ffff",
        0,
        Default::default(),
        vec![],
    );
    assert!(chain.append(second));
    assert_eq!(chain.len(), 2);
}

/// S4: deterministic election over a fixed stake table and the pinned
/// genesis head.
#[test]
fn s4_deterministic_election() {
    let mut stakes = HashMap::new();
    stakes.insert("staker10".to_string(), 40);
    stakes.insert("staker20".to_string(), 25);
    stakes.insert("staker30".to_string(), 20);

    let mut a = Staker::new("staker10");
    a.initialize_stakes(stakes.clone());
    let mut b = Staker::new("staker20");
    b.initialize_stakes(stakes);

    let chain = Chain::new();
    let result_a = a.select_staker(&chain).unwrap();
    let result_b = b.select_staker(&chain).unwrap();

    assert_eq!(result_a, result_b);
    assert_eq!(result_a.1, 1);
}

/// S5: aggregation correctness over two disjoint miner assignments.
#[test]
fn s5_aggregation_correctness() {
    let t0 = vec![Transaction::new("a", "b", 1, "1", Map::new())];
    let t1 = vec![
        Transaction::new("c", "d", 2, "1", Map::new()),
        Transaction::new("e", "f", 3, "1", Map::new()),
    ];

    let root0 = merkle_root(t0.iter().map(|t| t.calculate_hash()));
    let root1 = merkle_root(t1.iter().map(|t| t.calculate_hash()));
    let sb0 = ShardBlock::new(0, "miner0", "1", root0, "0x1f00ffff", t0.clone());
    let sb1 = ShardBlock::new(1, "miner1", "1", root1, "0x1f00ffff", t1.clone());

    let staker = Staker::new("staker10");
    let mut chain = Chain::new();
    let (accepted, block) = staker.propose_main_block(&mut chain, "0x1f00ffff", &[sb0, sb1]);
    assert!(accepted);

    let combined: Vec<_> = t0.into_iter().chain(t1).collect();
    let expected_root = merkle_root(combined.iter().map(|t| t.calculate_hash()));
    assert_eq!(block.tx_root, expected_root);
    assert_eq!(block.shard_data.len(), 2);
    assert!(block.shard_data.contains_key("miner0"));
    assert!(block.shard_data.contains_key("miner1"));
}

/// S6: main-block dissemination brings two stakers' chains to equal
/// heads.
#[test]
fn s6_main_block_dissemination() {
    let proposer = Staker::new("staker10");
    let mut proposer_chain = Chain::new();
    let (accepted, block) = proposer.propose_main_block(&mut proposer_chain, "0x1f00ffff", &[]);
    assert!(accepted);

    let envelope = ssam_chain::network::message::Envelope::main_block("staker10", &block).unwrap();

    let peer = Staker::new("staker20");
    let mut peer_chain = Chain::new();
    let (peer_accepted, _) = peer
        .receive_main_block(&mut peer_chain, &envelope)
        .expect("MAIN_BLOCK envelope should decode");
    assert!(peer_accepted);

    assert_eq!(
        proposer_chain.head().compute_hash(),
        peer_chain.head().compute_hash()
    );
}
