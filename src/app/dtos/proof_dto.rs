use serde::{Deserialize, Serialize};

use crate::app::entities::proof_entity::{Groth16Proof, SolidityProof};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofDto {
    pub bundle_id: u64,
    pub proposal_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProofDto {
    pub proof: Groth16Proof,
    pub public_signals: Vec<String>,
    pub formatted_proof: SolidityProof,
    pub approval_count: u64,
    pub quorum_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishProofDto {
    pub bundle_id: u64,
    pub proposal_id: u64,
    pub proof: Groth16Proof,
    pub public_signals: Vec<String>,
    #[serde(default)]
    pub campaign_type: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcomeDto {
    pub success: bool,
    pub already_published: bool,
    pub tx_hash: Option<String>,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofStatusDto {
    pub bundle_id: u64,
    pub proposal_id: u64,
    pub verified: bool,
}
