use alloy_primitives::{B256, U256};
use std::collections::HashSet;
use std::sync::Arc;

use super::committee_registry::Council;
use super::proving_backend::ProvingBackend;
use crate::app::dtos::witness_dto::CircuitInputs;
use crate::app::entities::proof_entity::ProofBundle;
use crate::app::entities::vote_entity::Vote;
use crate::app::errors::{CoordinatorError, CoordinatorResult};
use crate::app::utils::field_helper::{
    hash_to_field_string, parse_scalar, reduce_to_field, u64_to_field_string,
};
use crate::app::utils::merkle_tree_helper::{MerklePath, COUNCIL_SLOTS};

/// Nullifier-set root passed while nullifier uniqueness is not tracked on chain.
pub const NULLIFIER_ROOT_SENTINEL: &str = "0";

/// One of the circuit's fixed member slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitSlot {
    Cast {
        vote: u8,
        commitment: B256,
        nullifier: U256,
        path: MerklePath,
    },
    Empty,
}

impl CircuitSlot {
    pub fn is_valid(&self) -> bool {
        matches!(self, CircuitSlot::Cast { .. })
    }
}

/// Packs the votes into the leading slots, ordered by their voters' leaf
/// index, and zero-fills the rest.
pub fn assign_slots(votes: &[Vote], council: &Council) -> CoordinatorResult<Vec<CircuitSlot>> {
    if votes.len() > COUNCIL_SLOTS {
        return Err(CoordinatorError::Validation(format!(
            "{} votes exceed the {} circuit slots",
            votes.len(),
            COUNCIL_SLOTS
        )));
    }

    let mut placed: Vec<(usize, CircuitSlot)> = Vec::with_capacity(votes.len());
    let mut leaves = HashSet::new();
    let mut nullifiers = HashSet::new();
    for vote in votes {
        let index = council
            .position(&vote.voter_address)
            .ok_or_else(|| CoordinatorError::NotAMember(vote.voter_address.clone()))?;
        if !leaves.insert(index) {
            return Err(CoordinatorError::Validation(format!(
                "more than one vote from {}",
                vote.voter_address
            )));
        }
        let nullifier = parse_scalar(&vote.nullifier)
            .map(reduce_to_field)
            .ok_or_else(|| {
                CoordinatorError::Validation(format!("malformed nullifier {}", vote.nullifier))
            })?;
        if !nullifiers.insert(nullifier) {
            return Err(CoordinatorError::Validation(format!(
                "nullifier {} is used twice",
                vote.nullifier
            )));
        }
        placed.push((
            index,
            CircuitSlot::Cast {
                vote: vote.vote,
                commitment: council.members()[index].commitment,
                nullifier,
                path: council.path(index)?,
            },
        ));
    }

    placed.sort_by_key(|(index, _)| *index);
    let mut slots: Vec<CircuitSlot> = placed.into_iter().map(|(_, slot)| slot).collect();
    slots.resize(COUNCIL_SLOTS, CircuitSlot::Empty);
    Ok(slots)
}

pub fn build_inputs(
    bundle_id: u64,
    proposal_id: u64,
    slots: &[CircuitSlot],
    council_root: &B256,
    approval_count: u64,
    quorum_threshold: u64,
) -> CircuitInputs {
    let mut inputs = CircuitInputs {
        valid: Vec::with_capacity(slots.len()),
        votes: Vec::with_capacity(slots.len()),
        commitments: Vec::with_capacity(slots.len()),
        nullifiers: Vec::with_capacity(slots.len()),
        path_elements: Vec::with_capacity(slots.len()),
        path_indices: Vec::with_capacity(slots.len()),
        bundle_id: u64_to_field_string(bundle_id),
        proposal_id: u64_to_field_string(proposal_id),
        approval_count: u64_to_field_string(approval_count),
        quorum_threshold: u64_to_field_string(quorum_threshold),
        council_root: hash_to_field_string(council_root),
        nullifier_root: NULLIFIER_ROOT_SENTINEL.to_string(),
    };

    for slot in slots {
        let (vote, commitment, nullifier, path) = match slot {
            CircuitSlot::Cast {
                vote,
                commitment,
                nullifier,
                path,
            } => (*vote, *commitment, *nullifier, path.clone()),
            CircuitSlot::Empty => (0, B256::ZERO, U256::ZERO, MerklePath::empty()),
        };
        inputs.valid.push(u8::from(slot.is_valid()));
        inputs.votes.push(vote);
        inputs.commitments.push(hash_to_field_string(&commitment));
        inputs.nullifiers.push(nullifier.to_string());
        inputs
            .path_elements
            .push(path.path_elements.iter().map(hash_to_field_string).collect());
        inputs.path_indices.push(path.path_indices);
    }
    inputs
}

/// Turns a vote set into a Groth16 attestation of "approvals ≥ threshold".
///
/// Holds no state; reads votes and the roster, never writes them.
pub struct ProofCompiler {
    backend: Arc<dyn ProvingBackend>,
}

impl ProofCompiler {
    pub fn new(backend: Arc<dyn ProvingBackend>) -> Self {
        ProofCompiler { backend }
    }

    pub async fn compile(
        &self,
        bundle_id: u64,
        proposal_id: u64,
        votes: &[Vote],
        council: &Council,
        quorum_threshold: u64,
    ) -> CoordinatorResult<ProofBundle> {
        if let Some(stray) = votes
            .iter()
            .find(|vote| vote.bundle_id != bundle_id || vote.proposal_id != proposal_id)
        {
            return Err(CoordinatorError::Validation(format!(
                "vote from {} belongs to bundle {} proposal {}",
                stray.voter_address, stray.bundle_id, stray.proposal_id
            )));
        }

        let approval_count = votes.iter().filter(|vote| vote.is_approval()).count() as u64;
        if approval_count < quorum_threshold {
            return Err(CoordinatorError::QuorumNotMet {
                approvals: approval_count,
                threshold: quorum_threshold,
            });
        }

        let slots = assign_slots(votes, council)?;
        let inputs = build_inputs(
            bundle_id,
            proposal_id,
            &slots,
            &council.root(),
            approval_count,
            quorum_threshold,
        );

        log::info!(
            "Compiling proof for bundle {} proposal {}: {} approvals of {} votes, threshold {}",
            bundle_id,
            proposal_id,
            approval_count,
            votes.len(),
            quorum_threshold
        );
        let response = self.backend.prove(&inputs).await?;
        response
            .proof
            .to_solidity()
            .map_err(|e| CoordinatorError::ProofBackend(format!("unusable proof: {}", e)))?;

        Ok(ProofBundle {
            bundle_id,
            proposal_id,
            approval_count,
            quorum_threshold,
            proof: response.proof,
            public_signals: response.public_signals,
        })
    }
}
