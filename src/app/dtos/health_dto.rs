use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: String,
    pub council_root: Option<B256>,
    pub member_count: usize,
    pub pending_bundles: usize,
    pub quorum: u64,
    pub auto_publish: bool,
    pub chain_publisher: bool,
    pub tee_attestation: bool,
}
