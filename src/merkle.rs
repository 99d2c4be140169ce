//! Pairwise SHA-256 Merkle root over hex-string leaves.
//!
//! The tree concatenates hex *strings*, not raw bytes, before hashing.
//! This is non-canonical but matches the network's wire-compatible hash
//! contract, so it is kept rather than "fixed".

use sha2::{Digest, Sha256};

fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes the Merkle root of an ordered sequence of hex-encoded hashes.
///
/// An empty input yields the empty string. A single leaf is its own root.
pub fn merkle_root<I, S>(hashes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut level: Vec<String> = hashes.into_iter().map(Into::into).collect();

    if level.is_empty() {
        return String::new();
    }

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level.last().unwrap().clone();
            level.push(last);
        }
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    level.into_iter().next().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_string() {
        let empty: Vec<String> = vec![];
        assert_eq!(merkle_root(empty), "");
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        assert_eq!(merkle_root(vec!["abc"]), "abc");
    }

    #[test]
    fn two_leaves_hash_directly() {
        let root = merkle_root(vec!["a", "b"]);
        assert_eq!(root, hash_pair("a", "b"));
    }

    #[test]
    fn odd_leaf_count_duplicates_last() {
        let root = merkle_root(vec!["a", "b", "c"]);
        let ab = hash_pair("a", "b");
        let cc = hash_pair("c", "c");
        assert_eq!(root, hash_pair(&ab, &cc));
    }

    #[test]
    fn four_leaves_build_two_levels() {
        let root = merkle_root(vec!["a", "b", "c", "d"]);
        let ab = hash_pair("a", "b");
        let cd = hash_pair("c", "d");
        assert_eq!(root, hash_pair(&ab, &cd));
    }
}
