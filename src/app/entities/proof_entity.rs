use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::utils::field_helper::parse_scalar;

/// Groth16 proof in the layout emitted by snarkjs-style provers.
///
/// Points are affine coordinates encoded as decimal strings; `pi_a` and
/// `pi_c` may carry a trailing projective `"1"` coordinate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Groth16Proof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofFormatError {
    #[error("{0} is missing coordinates")]
    MissingCoordinate(&'static str),

    #[error("{component} holds a non-numeric coordinate: {value}")]
    InvalidCoordinate {
        component: &'static str,
        value: String,
    },
}

/// The `(a, b, c)` tuple the verifier contract's `submitProof` takes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SolidityProof {
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
}

fn coordinate(
    values: &[String],
    index: usize,
    component: &'static str,
) -> Result<U256, ProofFormatError> {
    let value = values
        .get(index)
        .ok_or(ProofFormatError::MissingCoordinate(component))?;
    parse_scalar(value).ok_or_else(|| ProofFormatError::InvalidCoordinate {
        component,
        value: value.clone(),
    })
}

fn g2_row(rows: &[Vec<String>], index: usize) -> Result<&[String], ProofFormatError> {
    rows.get(index)
        .map(Vec::as_slice)
        .ok_or(ProofFormatError::MissingCoordinate("pi_b"))
}

impl Groth16Proof {
    /// Re-encodes the proof for the verifier contract.
    ///
    /// The prover writes each G2 coordinate as `[c0, c1]` while the
    /// precompile-backed verifier reads `[c1, c0]`, so every `pi_b` row is
    /// swapped.
    pub fn to_solidity(&self) -> Result<SolidityProof, ProofFormatError> {
        let b0 = g2_row(&self.pi_b, 0)?;
        let b1 = g2_row(&self.pi_b, 1)?;
        Ok(SolidityProof {
            a: [
                coordinate(&self.pi_a, 0, "pi_a")?,
                coordinate(&self.pi_a, 1, "pi_a")?,
            ],
            b: [
                [coordinate(b0, 1, "pi_b")?, coordinate(b0, 0, "pi_b")?],
                [coordinate(b1, 1, "pi_b")?, coordinate(b1, 0, "pi_b")?],
            ],
            c: [
                coordinate(&self.pi_c, 0, "pi_c")?,
                coordinate(&self.pi_c, 1, "pi_c")?,
            ],
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProofBundle {
    #[serde(rename = "bundleId")]
    pub bundle_id: u64,

    #[serde(rename = "proposalId")]
    pub proposal_id: u64,

    #[serde(rename = "approvalCount")]
    pub approval_count: u64,

    #[serde(rename = "quorumThreshold")]
    pub quorum_threshold: u64,

    #[serde(rename = "proof")]
    pub proof: Groth16Proof,

    #[serde(rename = "publicSignals")]
    pub public_signals: Vec<String>,
}

/// Receipt data of a confirmed `submitProof` transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    #[serde(rename = "txHash")]
    pub tx_hash: String,

    #[serde(rename = "blockNumber")]
    pub block_number: u64,

    #[serde(rename = "gasUsed")]
    pub gas_used: u64,
}
