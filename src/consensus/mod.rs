//! Proof-of-work: target encoding and nonce search.

pub mod pow;

pub use pow::{
    default_nbits, default_target, find_valid_nonce, is_valid_proof, nbits_to_target,
    target_to_nbits, Minable, MAX_NONCE,
};
