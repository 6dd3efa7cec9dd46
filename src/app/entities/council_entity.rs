use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CouncilMember {
    /// Lowercase `0x` address.
    #[serde(rename = "address")]
    pub address: String,

    #[serde(rename = "secretShare", skip_serializing, default)]
    pub secret_share: String,

    #[serde(rename = "commitment")]
    pub commitment: B256,
}
