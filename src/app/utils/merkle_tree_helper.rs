use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of member slots the attestation circuit is compiled for.
pub const COUNCIL_SLOTS: usize = 8;

/// Depth of the committee tree, `ceil(log2(COUNCIL_SLOTS))`.
pub const TREE_DEPTH: usize = ceil_log2(COUNCIL_SLOTS);

pub const fn ceil_log2(n: usize) -> usize {
    let mut depth = 0;
    while (1usize << depth) < n {
        depth += 1;
    }
    depth
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("tree needs at least one leaf")]
    Empty,

    #[error("tree holds at most {max} leaves, got {got}")]
    TooManyLeaves { max: usize, got: usize },

    #[error("leaf index {0} is out of range")]
    LeafOutOfRange(usize),
}

/// `H(address, secret)`: keccak-256 over the 20 address bytes followed by the secret.
pub fn member_commitment(address: &Address, secret: &str) -> B256 {
    let mut preimage = Vec::with_capacity(20 + secret.len());
    preimage.extend_from_slice(address.as_slice());
    preimage.extend_from_slice(secret.as_bytes());
    keccak256(&preimage)
}

pub fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(left.as_slice());
    preimage[32..].copy_from_slice(right.as_slice());
    keccak256(preimage)
}

/// Sibling path from a leaf up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerklePath {
    pub leaf_index: usize,
    pub path_elements: Vec<B256>,
    /// `1` when the node at that level is the right child.
    pub path_indices: Vec<u8>,
}

impl MerklePath {
    /// Path of a zero-filled circuit slot.
    pub fn empty() -> Self {
        MerklePath {
            leaf_index: 0,
            path_elements: vec![B256::ZERO; TREE_DEPTH],
            path_indices: vec![0; TREE_DEPTH],
        }
    }
}

/// Binary Merkle tree of fixed depth over an ordered list of commitments.
///
/// Levels with odd cardinality duplicate their last node, so a lone node
/// below the root is hashed with itself.
#[derive(Debug, Clone)]
pub struct CommitteeTree {
    levels: Vec<Vec<B256>>,
}

impl CommitteeTree {
    pub fn new(leaves: Vec<B256>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::Empty);
        }
        if leaves.len() > COUNCIL_SLOTS {
            return Err(MerkleError::TooManyLeaves {
                max: COUNCIL_SLOTS,
                got: leaves.len(),
            });
        }

        let mut levels = Vec::with_capacity(TREE_DEPTH + 1);
        levels.push(leaves);
        for depth in 0..TREE_DEPTH {
            let next: Vec<B256> = levels[depth]
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }
        Ok(CommitteeTree { levels })
    }

    pub fn root(&self) -> B256 {
        self.levels[TREE_DEPTH][0]
    }

    pub fn leaves(&self) -> &[B256] {
        &self.levels[0]
    }

    pub fn proof(&self, leaf_index: usize) -> Result<MerklePath, MerkleError> {
        if leaf_index >= self.leaves().len() {
            return Err(MerkleError::LeafOutOfRange(leaf_index));
        }

        let mut path_elements = Vec::with_capacity(TREE_DEPTH);
        let mut path_indices = Vec::with_capacity(TREE_DEPTH);
        let mut index = leaf_index;
        for level in &self.levels[..TREE_DEPTH] {
            let sibling = level.get(index ^ 1).unwrap_or(&level[index]);
            path_elements.push(*sibling);
            path_indices.push((index & 1) as u8);
            index >>= 1;
        }

        Ok(MerklePath {
            leaf_index,
            path_elements,
            path_indices,
        })
    }
}

/// Recomputes the root from `leaf` along `path` and compares it with `root`.
pub fn verify_membership_proof(leaf: &B256, path: &MerklePath, root: &B256) -> bool {
    if path.path_elements.len() != path.path_indices.len() {
        return false;
    }
    let computed = path
        .path_elements
        .iter()
        .zip(&path.path_indices)
        .fold(*leaf, |node, (sibling, is_right)| {
            if *is_right == 1 {
                hash_pair(sibling, &node)
            } else {
                hash_pair(&node, sibling)
            }
        });
    computed == *root
}
