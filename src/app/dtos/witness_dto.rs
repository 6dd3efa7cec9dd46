use serde::{Deserialize, Serialize};

use crate::app::entities::proof_entity::Groth16Proof;

/// Input vector of the attestation circuit.
///
/// Per-slot arrays have one entry per council slot. `valid` separates a cast
/// vote from a zero-filled slot, so an empty slot never reads as a reject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInputs {
    pub valid: Vec<u8>,
    pub votes: Vec<u8>,
    pub commitments: Vec<String>,
    pub nullifiers: Vec<String>,
    pub path_elements: Vec<Vec<String>>,
    pub path_indices: Vec<Vec<u8>>,

    pub bundle_id: String,
    pub proposal_id: String,
    pub approval_count: String,
    pub quorum_threshold: String,
    pub council_root: String,
    pub nullifier_root: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProverResponseDto {
    pub proof: Groth16Proof,

    #[serde(rename = "publicSignals")]
    pub public_signals: Vec<String>,
}
