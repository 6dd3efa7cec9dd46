use std::sync::Arc;

use crate::app::entities::vote_entity::{vote_key, BallotKey, Vote, VoteCount, APPROVE, REJECT};
use crate::app::errors::{CoordinatorError, CoordinatorResult};
use crate::app::repository::traits::{RepositoryError, VoteStore};

/// One vote per `(bundle, proposal, member)` plus running tallies.
pub struct VoteLedger {
    store: Arc<dyn VoteStore>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        VoteLedger { store }
    }

    /// Persists `vote` and returns the tally including it.
    ///
    /// The first vote for a key is final; later attempts fail with
    /// [`CoordinatorError::DuplicateVote`] and leave the ledger untouched.
    pub async fn record_vote(&self, vote: &Vote) -> CoordinatorResult<VoteCount> {
        if vote.vote != APPROVE && vote.vote != REJECT {
            return Err(CoordinatorError::Validation(format!(
                "vote must be 0 or 1, got {}",
                vote.vote
            )));
        }

        match self.store.insert_vote(vote).await {
            Ok(count) => {
                log::info!(
                    "Recorded vote {} from {} on bundle {} proposal {} ({} approve / {} reject)",
                    vote.vote,
                    vote.voter_address,
                    vote.bundle_id,
                    vote.proposal_id,
                    count.approvals,
                    count.rejections
                );
                Ok(count)
            }
            Err(RepositoryError::Duplicate(key)) => {
                log::warn!("Rejected duplicate vote {}", key);
                Err(CoordinatorError::DuplicateVote {
                    bundle_id: vote.bundle_id,
                    proposal_id: vote.proposal_id,
                    voter: vote.voter_address.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn has_voted(
        &self,
        bundle_id: u64,
        proposal_id: u64,
        voter_address: &str,
    ) -> CoordinatorResult<bool> {
        let key = vote_key(bundle_id, proposal_id, voter_address);
        Ok(self.store.contains_vote(&key).await?)
    }

    /// All votes for the pair, unordered.
    pub async fn get_votes(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<Vec<Vote>> {
        Ok(self
            .store
            .find_votes(BallotKey::new(bundle_id, proposal_id))
            .await?)
    }

    pub async fn get_vote_count(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<VoteCount> {
        Ok(self
            .store
            .find_count(BallotKey::new(bundle_id, proposal_id))
            .await?)
    }

    /// Ballots still short of `quorum` approvals, in key order.
    pub async fn pending_bundles(&self, quorum: u64) -> CoordinatorResult<Vec<BallotKey>> {
        let mut pending: Vec<BallotKey> = self
            .store
            .find_all_counts()
            .await?
            .into_iter()
            .filter(|(_, count)| count.approvals < quorum)
            .map(|(ballot, _)| ballot)
            .collect();
        pending.sort();
        Ok(pending)
    }

    /// Rebuilds the stored aggregate by replaying the recorded votes.
    ///
    /// The replay and the write happen inside the store as one step, so a
    /// vote recorded concurrently is either part of the replay or applied on
    /// top of it.
    pub async fn recount(&self, bundle_id: u64, proposal_id: u64) -> CoordinatorResult<VoteCount> {
        let (previous, rebuilt) = self
            .store
            .rebuild_count(BallotKey::new(bundle_id, proposal_id))
            .await?;
        if previous != rebuilt {
            log::warn!(
                "Tally drift on bundle {} proposal {}: stored {:?}, replayed {:?}",
                bundle_id,
                proposal_id,
                previous,
                rebuilt
            );
        }
        Ok(rebuilt)
    }
}
