use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::app::dtos::witness_dto::{CircuitInputs, ProverResponseDto};
use crate::app::errors::{CoordinatorError, CoordinatorResult};

/// External Groth16 prover for the attestation circuit.
#[async_trait]
pub trait ProvingBackend: Send + Sync {
    async fn prove(&self, inputs: &CircuitInputs) -> CoordinatorResult<ProverResponseDto>;
}

/// Prover reached over HTTP: the circuit inputs are posted as JSON and the
/// reply carries the proof and its public signals.
pub struct HttpProvingBackend {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpProvingBackend {
    pub fn new(url: &str, timeout: Duration) -> Self {
        HttpProvingBackend {
            client: Client::new(),
            url: url.to_string(),
            timeout,
        }
    }
}

fn backend_error(error: reqwest::Error) -> CoordinatorError {
    if error.is_timeout() {
        CoordinatorError::ProofBackendTimeout
    } else {
        CoordinatorError::ProofBackend(error.to_string())
    }
}

#[async_trait]
impl ProvingBackend for HttpProvingBackend {
    async fn prove(&self, inputs: &CircuitInputs) -> CoordinatorResult<ProverResponseDto> {
        log::debug!(
            "Requesting proof for bundle {} proposal {} from {}",
            inputs.bundle_id,
            inputs.proposal_id,
            self.url
        );
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(inputs)
            .send()
            .await
            .map_err(backend_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoordinatorError::ProofBackend(format!(
                "prover responded {}: {}",
                status, body
            )));
        }

        response
            .json::<ProverResponseDto>()
            .await
            .map_err(backend_error)
    }
}
