#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use council_attest::app::dtos::council_dto::MemberSecretDto;
use council_attest::app::dtos::vote_dto::CastVoteDto;
use council_attest::app::dtos::witness_dto::{CircuitInputs, ProverResponseDto};
use council_attest::app::entities::proof_entity::{Groth16Proof, TxReceipt};
use council_attest::app::entities::vote_entity::Vote;
use council_attest::app::errors::{CoordinatorError, CoordinatorResult};
use council_attest::app::repository::memory_vote_store::MemoryVoteStore;
use council_attest::app::services::coordinator_service::{CoordinatorOptions, CoordinatorService};
use council_attest::app::services::proving_backend::ProvingBackend;
use council_attest::app::services::verifier_contract::{SubmitProofRequest, VerifierContract};

pub fn member_address(index: usize) -> String {
    format!("0x{:040x}", index + 1)
}

pub fn roster(size: usize) -> Vec<MemberSecretDto> {
    (0..size)
        .map(|i| MemberSecretDto {
            address: member_address(i),
            secret: format!("secret-{}", i),
        })
        .collect()
}

pub fn nullifier(bundle_id: u64, proposal_id: u64, member: usize) -> String {
    format!("0x{:x}", bundle_id * 1_000_000 + proposal_id * 1_000 + member as u64 + 1)
}

pub fn cast(bundle_id: u64, proposal_id: u64, member: usize, vote: u8) -> CastVoteDto {
    CastVoteDto {
        bundle_id,
        proposal_id,
        voter_address: member_address(member),
        vote,
        signature: "0x5167".to_string(),
        nullifier: nullifier(bundle_id, proposal_id, member),
    }
}

pub fn vote(bundle_id: u64, proposal_id: u64, member: usize, bit: u8) -> Vote {
    Vote {
        bundle_id,
        proposal_id,
        voter_address: member_address(member),
        vote: bit,
        signature: "0x5167".to_string(),
        nullifier: nullifier(bundle_id, proposal_id, member),
        timestamp: 0,
    }
}

pub fn sample_proof() -> Groth16Proof {
    let strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
    Groth16Proof {
        pi_a: strings(&["11", "12", "1"]),
        pi_b: vec![strings(&["21", "22"]), strings(&["23", "24"]), strings(&["1", "0"])],
        pi_c: strings(&["31", "32", "1"]),
        protocol: Some("groth16".to_string()),
        curve: Some("bn128".to_string()),
    }
}

pub enum ProverMode {
    Succeed,
    Fail,
    TimeOut,
}

/// Prover double that echoes the public inputs back as signals.
pub struct MockProver {
    pub calls: AtomicUsize,
    pub last_inputs: Mutex<Option<CircuitInputs>>,
    mode: Mutex<ProverMode>,
}

impl MockProver {
    pub fn new() -> Self {
        MockProver {
            calls: AtomicUsize::new(0),
            last_inputs: Mutex::new(None),
            mode: Mutex::new(ProverMode::Succeed),
        }
    }

    pub fn set_mode(&self, mode: ProverMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_inputs(&self) -> CircuitInputs {
        self.last_inputs.lock().unwrap().clone().expect("prover was not called")
    }
}

#[async_trait]
impl ProvingBackend for MockProver {
    async fn prove(&self, inputs: &CircuitInputs) -> CoordinatorResult<ProverResponseDto> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_inputs.lock().unwrap() = Some(inputs.clone());
        match *self.mode.lock().unwrap() {
            ProverMode::Succeed => {}
            ProverMode::Fail => {
                return Err(CoordinatorError::ProofBackend("witness generation failed".to_string()))
            }
            ProverMode::TimeOut => return Err(CoordinatorError::ProofBackendTimeout),
        }
        Ok(ProverResponseDto {
            proof: sample_proof(),
            public_signals: vec![
                inputs.approval_count.clone(),
                inputs.quorum_threshold.clone(),
                inputs.council_root.clone(),
                inputs.bundle_id.clone(),
                inputs.proposal_id.clone(),
            ],
        })
    }
}

/// In-memory stand-in for the verifier contract.
pub struct MockVerifier {
    verified: Mutex<HashSet<(u64, u64)>>,
    pub submissions: AtomicUsize,
    pub status_checks: AtomicUsize,
    pub revert: AtomicBool,
    pub last_request: Mutex<Option<SubmitProofRequest>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        MockVerifier {
            verified: Mutex::new(HashSet::new()),
            submissions: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            revert: AtomicBool::new(false),
            last_request: Mutex::new(None),
        }
    }

    pub fn mark_verified(&self, bundle_id: u64, proposal_id: u64) {
        self.verified.lock().unwrap().insert((bundle_id, proposal_id));
    }

    pub fn is_verified(&self, bundle_id: u64, proposal_id: u64) -> bool {
        self.verified.lock().unwrap().contains(&(bundle_id, proposal_id))
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerifierContract for MockVerifier {
    async fn has_verified_proof(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<bool> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.is_verified(bundle_id, proposal_id))
    }

    async fn submit_proof(&self, request: &SubmitProofRequest) -> CoordinatorResult<TxReceipt> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.lock().unwrap() = Some(request.clone());
        if self.revert.load(Ordering::SeqCst) {
            return Err(CoordinatorError::PublishFailed(
                "execution reverted: invalid proof".to_string(),
            ));
        }
        let mut verified = self.verified.lock().unwrap();
        if !verified.insert((request.bundle_id, request.proposal_id)) {
            return Err(CoordinatorError::PublishFailed(
                "execution reverted: proof already verified".to_string(),
            ));
        }
        Ok(TxReceipt {
            tx_hash: format!("0x{:064x}", n),
            block_number: 100 + n as u64,
            gas_used: 250_000,
        })
    }
}

pub struct Harness {
    pub service: Arc<CoordinatorService>,
    pub prover: Arc<MockProver>,
    pub verifier: Arc<MockVerifier>,
}

pub fn harness(quorum_threshold: u64, auto_publish: bool) -> Harness {
    let prover = Arc::new(MockProver::new());
    let verifier = Arc::new(MockVerifier::new());
    let service = CoordinatorService::new(
        Arc::new(MemoryVoteStore::new()),
        prover.clone(),
        Some(verifier.clone()),
        CoordinatorOptions {
            quorum_threshold,
            auto_publish,
            tee_attestation: false,
        },
    );
    Harness {
        service: Arc::new(service),
        prover,
        verifier,
    }
}
