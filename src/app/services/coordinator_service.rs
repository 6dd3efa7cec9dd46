use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use super::chain_publisher::ChainPublisher;
use super::committee_registry::CommitteeRegistry;
use super::proof_compiler::ProofCompiler;
use super::proving_backend::ProvingBackend;
use super::verifier_contract::VerifierContract;
use super::vote_ledger::VoteLedger;
use crate::app::dtos::council_dto::{
    CouncilMemberDto, CouncilResponseDto, CouncilSummaryDto, MembershipProofDto, SetupCouncilDto,
};
use crate::app::dtos::health_dto::HealthDto;
use crate::app::dtos::proof_dto::{GeneratedProofDto, PublishOutcomeDto, PublishProofDto};
use crate::app::dtos::vote_dto::{CastVoteDto, PendingBundlesDto, VoteOutcomeDto, VoteStatusDto};
use crate::app::entities::proof_entity::{ProofBundle, TxReceipt};
use crate::app::entities::vote_entity::{Vote, VoteCount};
use crate::app::errors::{CoordinatorError, CoordinatorResult};
use crate::app::repository::traits::VoteStore;
use crate::app::utils::field_helper::{normalize_address, parse_address, parse_scalar};

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorOptions {
    pub quorum_threshold: u64,
    pub auto_publish: bool,
    pub tee_attestation: bool,
}

/// Campaign type used when a proof is published automatically on quorum.
pub const DEFAULT_CAMPAIGN_TYPE: u8 = 0;

/// Largest accepted bundle or proposal id; ids are stored as BSON int64.
pub const MAX_BALLOT_ID: u64 = i64::MAX as u64;

fn check_ballot(bundle_id: u64, proposal_id: u64) -> CoordinatorResult<()> {
    if bundle_id > MAX_BALLOT_ID || proposal_id > MAX_BALLOT_ID {
        return Err(CoordinatorError::Validation(format!(
            "bundleId and proposalId must not exceed {}",
            MAX_BALLOT_ID
        )));
    }
    Ok(())
}

/// Result of attesting a ballot right after it reached quorum.
struct Attestation {
    bundle: ProofBundle,
    receipt: Option<TxReceipt>,
    publish_error: Option<String>,
}

/// Wires the registry, ledger, compiler and publisher behind the HTTP routes.
pub struct CoordinatorService {
    registry: CommitteeRegistry,
    ledger: VoteLedger,
    compiler: ProofCompiler,
    publisher: Option<ChainPublisher>,
    options: CoordinatorOptions,
}

impl CoordinatorService {
    pub fn new(
        store: Arc<dyn VoteStore>,
        backend: Arc<dyn ProvingBackend>,
        contract: Option<Arc<dyn VerifierContract>>,
        options: CoordinatorOptions,
    ) -> Self {
        CoordinatorService {
            registry: CommitteeRegistry::new(),
            ledger: VoteLedger::new(store),
            compiler: ProofCompiler::new(backend),
            publisher: contract.map(ChainPublisher::new),
            options,
        }
    }

    pub fn registry(&self) -> &CommitteeRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn quorum_threshold(&self) -> u64 {
        self.options.quorum_threshold
    }

    fn publisher(&self) -> CoordinatorResult<&ChainPublisher> {
        self.publisher
            .as_ref()
            .ok_or(CoordinatorError::ChainNotConfigured)
    }

    pub async fn health(&self) -> CoordinatorResult<HealthDto> {
        let pending = self
            .ledger
            .pending_bundles(self.options.quorum_threshold)
            .await?;
        Ok(HealthDto {
            status: "ok".to_string(),
            council_root: self.registry.current_root().await,
            member_count: self.registry.member_count().await,
            pending_bundles: pending.len(),
            quorum: self.options.quorum_threshold,
            auto_publish: self.options.auto_publish,
            chain_publisher: self.publisher.is_some(),
            tee_attestation: self.options.tee_attestation,
        })
    }

    pub async fn council(&self) -> CouncilResponseDto {
        match self.registry.snapshot().await {
            Some(council) => CouncilResponseDto {
                root: Some(council.root()),
                member_count: council.member_count(),
                members: council
                    .members()
                    .iter()
                    .map(|member| CouncilMemberDto {
                        address: member.address.clone(),
                        commitment: member.commitment,
                    })
                    .collect(),
            },
            None => CouncilResponseDto {
                root: None,
                member_count: 0,
                members: vec![],
            },
        }
    }

    pub async fn setup_council(&self, dto: SetupCouncilDto) -> CoordinatorResult<CouncilSummaryDto> {
        if let Err(e) = dto.validate() {
            return Err(CoordinatorError::InvalidRoster(e.to_string()));
        }
        self.registry.setup_council(&dto.members).await
    }

    pub async fn membership_proof(&self, address: &str) -> CoordinatorResult<MembershipProofDto> {
        self.registry.membership_proof(address).await
    }

    fn validate_vote(dto: &CastVoteDto) -> CoordinatorResult<()> {
        if let Err(e) = dto.validate() {
            return Err(CoordinatorError::Validation(e.to_string()));
        }
        if let Err(e) = dto.check_vote_bit() {
            return Err(CoordinatorError::Validation(e.code.to_string()));
        }
        check_ballot(dto.bundle_id, dto.proposal_id)?;
        if parse_address(&dto.voter_address).is_none() {
            return Err(CoordinatorError::Validation(format!(
                "malformed voterAddress {}",
                dto.voter_address
            )));
        }
        if parse_scalar(&dto.nullifier).is_none() {
            return Err(CoordinatorError::Validation(format!(
                "nullifier must be a decimal or 0x-hex scalar, got {}",
                dto.nullifier
            )));
        }
        Ok(())
    }

    /// Accepts a member's vote and, when it is the approval that brings the
    /// ballot to quorum, compiles the attestation (and publishes it when
    /// auto-publish is on).
    ///
    /// Attestation failures do not undo the recorded vote; they are reported
    /// in the outcome.
    pub async fn submit_vote(&self, dto: CastVoteDto) -> CoordinatorResult<VoteOutcomeDto> {
        Self::validate_vote(&dto)?;
        if !self.registry.is_member(&dto.voter_address).await {
            log::warn!("Vote from non-member {}", dto.voter_address);
            return Err(CoordinatorError::NotAMember(dto.voter_address));
        }

        let vote = Vote {
            bundle_id: dto.bundle_id,
            proposal_id: dto.proposal_id,
            voter_address: normalize_address(&dto.voter_address),
            vote: dto.vote,
            signature: dto.signature,
            nullifier: dto.nullifier,
            timestamp: Utc::now().timestamp_millis(),
        };
        let count = self.ledger.record_vote(&vote).await?;
        let quorum = self.options.quorum_threshold;

        let mut outcome = VoteOutcomeDto {
            success: true,
            quorum_reached: count.approvals >= quorum,
            vote_count: count,
            proof: None,
            tx_hash: None,
            attestation_error: None,
        };

        // Counts only grow, so exactly one approval observes `approvals == quorum`.
        if vote.is_approval() && count.approvals == quorum {
            log::info!(
                "Quorum reached on bundle {} proposal {}",
                vote.bundle_id,
                vote.proposal_id
            );
            match self.attest(vote.bundle_id, vote.proposal_id).await {
                Ok(attestation) => {
                    outcome.proof = Some(attestation.bundle.public_signals);
                    outcome.tx_hash = attestation.receipt.map(|receipt| receipt.tx_hash);
                    outcome.attestation_error = attestation.publish_error;
                }
                Err(e) => {
                    log::error!(
                        "Attestation for bundle {} proposal {} failed: {}",
                        vote.bundle_id,
                        vote.proposal_id,
                        e
                    );
                    outcome.attestation_error = Some(e.to_string());
                }
            }
        }
        Ok(outcome)
    }

    async fn attest(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<Attestation> {
        let bundle = self.generate_proof(bundle_id, proposal_id).await?;
        let mut attestation = Attestation {
            bundle,
            receipt: None,
            publish_error: None,
        };
        if !self.options.auto_publish {
            return Ok(attestation);
        }

        let published = match self.publisher() {
            Ok(publisher) => publisher.publish(&attestation.bundle, DEFAULT_CAMPAIGN_TYPE).await,
            Err(e) => Err(e),
        };
        match published {
            Ok(receipt) => attestation.receipt = Some(receipt),
            Err(CoordinatorError::AlreadyPublished { .. }) => {}
            Err(e) => attestation.publish_error = Some(e.to_string()),
        }
        Ok(attestation)
    }

    /// Compiles a proof over every vote recorded for the ballot.
    pub async fn generate_proof(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<ProofBundle> {
        check_ballot(bundle_id, proposal_id)?;
        let votes = self.ledger.get_votes(bundle_id, proposal_id).await?;
        if votes.is_empty() {
            return Err(CoordinatorError::NoVotes {
                bundle_id,
                proposal_id,
            });
        }
        let council = self
            .registry
            .snapshot()
            .await
            .ok_or_else(|| CoordinatorError::Validation("council is not set up".to_string()))?;
        self.compiler
            .compile(
                bundle_id,
                proposal_id,
                &votes,
                &council,
                self.options.quorum_threshold,
            )
            .await
    }

    pub async fn generate_proof_response(
        &self,
        bundle_id: u64,
        proposal_id: u64,
    ) -> CoordinatorResult<GeneratedProofDto> {
        let bundle = self.generate_proof(bundle_id, proposal_id).await?;
        let formatted_proof = bundle
            .proof
            .to_solidity()
            .map_err(|e| CoordinatorError::ProofBackend(e.to_string()))?;
        Ok(GeneratedProofDto {
            proof: bundle.proof,
            public_signals: bundle.public_signals,
            formatted_proof,
            approval_count: bundle.approval_count,
            quorum_threshold: bundle.quorum_threshold,
        })
    }

    /// Publishes a previously generated proof. Finding it already verified on
    /// chain counts as success.
    pub async fn publish_proof(&self, dto: PublishProofDto) -> CoordinatorResult<PublishOutcomeDto> {
        check_ballot(dto.bundle_id, dto.proposal_id)?;
        let publisher = self.publisher()?;
        let count = self
            .ledger
            .get_vote_count(dto.bundle_id, dto.proposal_id)
            .await?;
        if count.approvals < self.options.quorum_threshold {
            return Err(CoordinatorError::QuorumNotMet {
                approvals: count.approvals,
                threshold: self.options.quorum_threshold,
            });
        }

        let bundle = ProofBundle {
            bundle_id: dto.bundle_id,
            proposal_id: dto.proposal_id,
            approval_count: count.approvals,
            quorum_threshold: self.options.quorum_threshold,
            proof: dto.proof,
            public_signals: dto.public_signals,
        };
        match publisher.publish(&bundle, dto.campaign_type).await {
            Ok(receipt) => Ok(PublishOutcomeDto {
                success: true,
                already_published: false,
                tx_hash: Some(receipt.tx_hash),
                block_number: Some(receipt.block_number),
                gas_used: Some(receipt.gas_used),
            }),
            Err(CoordinatorError::AlreadyPublished { .. }) => Ok(PublishOutcomeDto {
                success: true,
                already_published: true,
                tx_hash: None,
                block_number: None,
                gas_used: None,
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn has_verified_proof(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<bool> {
        self.publisher()?
            .has_verified_proof(bundle_id, proposal_id)
            .await
    }

    pub async fn vote_status(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<VoteStatusDto> {
        check_ballot(bundle_id, proposal_id)?;
        let count = self.ledger.get_vote_count(bundle_id, proposal_id).await?;
        Ok(self.status_of(count))
    }

    fn status_of(&self, count: VoteCount) -> VoteStatusDto {
        let quorum = self.options.quorum_threshold;
        VoteStatusDto {
            approvals: count.approvals,
            rejections: count.rejections,
            total: count.total(),
            quorum,
            quorum_reached: count.approvals >= quorum,
        }
    }

    pub async fn recount(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<VoteStatusDto> {
        check_ballot(bundle_id, proposal_id)?;
        let count = self.ledger.recount(bundle_id, proposal_id).await?;
        Ok(self.status_of(count))
    }

    pub async fn pending_bundles(&self) -> CoordinatorResult<PendingBundlesDto> {
        let quorum = self.options.quorum_threshold;
        Ok(PendingBundlesDto {
            quorum,
            pending: self.ledger.pending_bundles(quorum).await?,
        })
    }
}
