use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::app::entities::vote_entity::{BallotKey, VoteCount};

fn validate_vote_bit(value: u8) -> Result<(), ValidationError> {
    if value > 1 {
        Err(ValidationError::new("vote must be 0 or 1"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteDto {
    pub bundle_id: u64,

    pub proposal_id: u64,

    #[validate(length(min = 1, message = "voterAddress is required"))]
    pub voter_address: String,

    pub vote: u8,

    #[validate(length(min = 1, message = "signature is required"))]
    pub signature: String,

    #[validate(length(min = 1, message = "nullifier is required"))]
    pub nullifier: String,
}

impl CastVoteDto {
    pub fn check_vote_bit(&self) -> Result<(), ValidationError> {
        validate_vote_bit(self.vote)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcomeDto {
    pub success: bool,
    pub quorum_reached: bool,
    pub vote_count: VoteCount,

    /// Public signals of the attestation, present on the vote that reached quorum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusDto {
    pub approvals: u64,
    pub rejections: u64,
    pub total: u64,
    pub quorum: u64,
    pub quorum_reached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasVotedDto {
    pub has_voted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBundlesDto {
    pub quorum: u64,
    pub pending: Vec<BallotKey>,
}
