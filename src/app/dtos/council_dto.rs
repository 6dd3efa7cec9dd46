use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::utils::merkle_tree_helper::MerklePath;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MemberSecretDto {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, message = "Secret is required"))]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetupCouncilDto {
    #[validate(length(min = 1, message = "Members are required"))]
    pub members: Vec<MemberSecretDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CouncilSummaryDto {
    pub root: B256,
    pub member_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilMemberDto {
    pub address: String,
    pub commitment: B256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilResponseDto {
    pub root: Option<B256>,
    pub member_count: usize,
    pub members: Vec<CouncilMemberDto>,
}

/// Inclusion proof of one member's commitment under the council root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MembershipProofDto {
    pub address: String,
    pub commitment: B256,
    pub root: B256,
    #[serde(flatten)]
    pub path: MerklePath,
}
