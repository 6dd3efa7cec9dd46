use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::verifier_contract::{SubmitProofRequest, VerifierContract};
use crate::app::entities::proof_entity::{ProofBundle, TxReceipt};
use crate::app::entities::vote_entity::BallotKey;
use crate::app::errors::{CoordinatorError, CoordinatorResult};

type InFlight = Mutex<HashSet<BallotKey>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashSet<BallotKey>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases a ballot's publish slot when dropped, including when the request
/// future is cancelled mid-submission.
struct PublishSlot<'a> {
    in_flight: &'a InFlight,
    ballot: BallotKey,
}

impl Drop for PublishSlot<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.ballot);
    }
}

/// Submits compiled proofs to the verifier contract. No retries happen here.
pub struct ChainPublisher {
    contract: Arc<dyn VerifierContract>,
    in_flight: InFlight,
}

impl ChainPublisher {
    pub fn new(contract: Arc<dyn VerifierContract>) -> Self {
        ChainPublisher {
            contract,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub async fn has_verified_proof(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<bool> {
        self.contract.has_verified_proof(bundle_id, proposal_id).await
    }

    /// Publishes `bundle` unless the chain already holds a verified proof for
    /// its ballot, in which case [`CoordinatorError::AlreadyPublished`] is
    /// returned and no transaction is sent.
    pub async fn publish(&self, bundle: &ProofBundle, campaign_type: u8) -> CoordinatorResult<TxReceipt> {
        let ballot = BallotKey::new(bundle.bundle_id, bundle.proposal_id);
        let proof = bundle
            .proof
            .to_solidity()
            .map_err(|e| CoordinatorError::Validation(e.to_string()))?;

        let claimed = lock(&self.in_flight).insert(ballot);
        if !claimed {
            return Err(CoordinatorError::PublishInFlight {
                bundle_id: ballot.bundle_id,
                proposal_id: ballot.proposal_id,
            });
        }
        let _slot = PublishSlot {
            in_flight: &self.in_flight,
            ballot,
        };

        if self
            .contract
            .has_verified_proof(ballot.bundle_id, ballot.proposal_id)
            .await?
        {
            log::info!(
                "Bundle {} proposal {} already verified on chain, skipping submission",
                ballot.bundle_id,
                ballot.proposal_id
            );
            return Err(CoordinatorError::AlreadyPublished {
                bundle_id: ballot.bundle_id,
                proposal_id: ballot.proposal_id,
            });
        }

        let request = SubmitProofRequest {
            bundle_id: bundle.bundle_id,
            proposal_id: bundle.proposal_id,
            approval_count: bundle.approval_count,
            campaign_type,
            proof,
        };
        match self.contract.submit_proof(&request).await {
            Ok(receipt) => {
                log::info!(
                    "Proof for bundle {} proposal {} confirmed in block {} ({})",
                    ballot.bundle_id,
                    ballot.proposal_id,
                    receipt.block_number,
                    receipt.tx_hash
                );
                Ok(receipt)
            }
            Err(e) => {
                log::error!(
                    "Publishing bundle {} proposal {} failed: {}",
                    ballot.bundle_id,
                    ballot.proposal_id,
                    e
                );
                Err(e)
            }
        }
    }
}
