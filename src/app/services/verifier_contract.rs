use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::app::entities::proof_entity::{SolidityProof, TxReceipt};
use crate::app::errors::{CoordinatorError, CoordinatorResult};

sol! {
    function submitProof(
        uint256 bundleId,
        uint256 proposalId,
        uint256 approvalCount,
        uint8 campaignType,
        uint256[2] pA,
        uint256[2][2] pB,
        uint256[2] pC
    ) external;

    function hasVerifiedProof(uint256 bundleId, uint256 proposalId) external view returns (bool verified);
}

#[derive(Debug, Clone)]
pub struct SubmitProofRequest {
    pub bundle_id: u64,
    pub proposal_id: u64,
    pub approval_count: u64,
    pub campaign_type: u8,
    pub proof: SolidityProof,
}

impl SubmitProofRequest {
    pub fn calldata(&self) -> Vec<u8> {
        submitProofCall {
            bundleId: U256::from(self.bundle_id),
            proposalId: U256::from(self.proposal_id),
            approvalCount: U256::from(self.approval_count),
            campaignType: self.campaign_type,
            pA: self.proof.a,
            pB: self.proof.b,
            pC: self.proof.c,
        }
        .abi_encode()
    }
}

/// The on-chain verifier. Its `hasVerifiedProof` state is authoritative.
#[async_trait]
pub trait VerifierContract: Send + Sync {
    async fn has_verified_proof(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<bool>;

    /// Sends `submitProof` and waits for the receipt. Reverts surface as
    /// [`CoordinatorError::PublishFailed`].
    async fn submit_proof(&self, request: &SubmitProofRequest) -> CoordinatorResult<TxReceipt>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize, Debug)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: String,
    gas_used: String,
    #[serde(default)]
    status: Option<String>,
}

fn parse_quantity(value: &str) -> CoordinatorResult<u64> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|e| CoordinatorError::PublishFailed(format!("bad quantity {}: {}", value, e)))
}

fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Verifier reached through an Ethereum JSON-RPC endpoint.
///
/// Transactions are sent with `eth_sendTransaction` from `signer`; the node
/// or the signing proxy in front of it holds the signer's key.
pub struct JsonRpcVerifier {
    client: Client,
    rpc_url: String,
    contract: Address,
    signer: Address,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl JsonRpcVerifier {
    pub fn new(rpc_url: &str, contract: Address, signer: Address, confirm_timeout: Duration) -> Self {
        JsonRpcVerifier {
            client: Client::new(),
            rpc_url: rpc_url.to_string(),
            contract,
            signer,
            confirm_timeout,
            poll_interval: Duration::from_secs(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> CoordinatorResult<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response: RpcResponse = self
            .client
            .post(&self.rpc_url)
            .timeout(self.confirm_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| CoordinatorError::PublishFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| CoordinatorError::PublishFailed(e.to_string()))?;

        if let Some(error) = response.error {
            let reason = match error.data {
                Some(data) => format!("{} ({}): {}", error.message, error.code, data),
                None => format!("{} ({})", error.message, error.code),
            };
            return Err(CoordinatorError::PublishFailed(reason));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> CoordinatorResult<TxReceipt> {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            let result = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !result.is_null() {
                let receipt: RpcReceipt = serde_json::from_value(result)
                    .map_err(|e| CoordinatorError::PublishFailed(e.to_string()))?;
                if receipt.status.as_deref() == Some("0x0") {
                    return Err(CoordinatorError::PublishFailed(format!(
                        "transaction {} reverted",
                        tx_hash
                    )));
                }
                return Ok(TxReceipt {
                    tx_hash: receipt.transaction_hash,
                    block_number: parse_quantity(&receipt.block_number)?,
                    gas_used: parse_quantity(&receipt.gas_used)?,
                });
            }
            if Instant::now() >= deadline {
                return Err(CoordinatorError::PublishFailed(format!(
                    "transaction {} not confirmed within {:?}",
                    tx_hash, self.confirm_timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl VerifierContract for JsonRpcVerifier {
    async fn has_verified_proof(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<bool> {
        let data = hasVerifiedProofCall {
            bundleId: U256::from(bundle_id),
            proposalId: U256::from(proposal_id),
        }
        .abi_encode();
        let result = self
            .call(
                "eth_call",
                json!([{ "to": self.contract.to_string(), "data": encode_hex(&data) }, "latest"]),
            )
            .await?;

        let encoded = result.as_str().unwrap_or_default();
        let bytes = hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| CoordinatorError::PublishFailed(e.to_string()))?;
        let decoded = hasVerifiedProofCall::abi_decode_returns(&bytes, true)
            .map_err(|e| CoordinatorError::PublishFailed(e.to_string()))?;
        Ok(decoded.verified)
    }

    async fn submit_proof(&self, request: &SubmitProofRequest) -> CoordinatorResult<TxReceipt> {
        let transaction = json!({
            "from": self.signer.to_string(),
            "to": self.contract.to_string(),
            "data": encode_hex(&request.calldata()),
        });
        let result = self
            .call("eth_sendTransaction", json!([transaction]))
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| CoordinatorError::PublishFailed("node returned no tx hash".to_string()))?
            .to_string();

        log::info!(
            "Submitted proof for bundle {} proposal {} in {}",
            request.bundle_id,
            request.proposal_id,
            tx_hash
        );
        self.wait_for_receipt(&tx_hash).await
    }
}
