use alloy_primitives::B256;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::app::dtos::council_dto::{CouncilSummaryDto, MemberSecretDto, MembershipProofDto};
use crate::app::entities::council_entity::CouncilMember;
use crate::app::errors::{CoordinatorError, CoordinatorResult};
use crate::app::utils::field_helper::{normalize_address, parse_address};
use crate::app::utils::merkle_tree_helper::{
    member_commitment, CommitteeTree, MerklePath, COUNCIL_SLOTS,
};

/// One roster epoch: the ordered members and the tree over their commitments.
#[derive(Debug)]
pub struct Council {
    members: Vec<CouncilMember>,
    tree: CommitteeTree,
}

impl Council {
    pub fn build(roster: &[MemberSecretDto]) -> CoordinatorResult<Self> {
        if roster.is_empty() {
            return Err(CoordinatorError::InvalidRoster(
                "Members are required".to_string(),
            ));
        }
        if roster.len() > COUNCIL_SLOTS {
            return Err(CoordinatorError::InvalidRoster(format!(
                "council holds at most {} members, got {}",
                COUNCIL_SLOTS,
                roster.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(roster.len());
        for entry in roster {
            let address = parse_address(&entry.address).ok_or_else(|| {
                CoordinatorError::InvalidRoster(format!("malformed address {}", entry.address))
            })?;
            if entry.secret.is_empty() {
                return Err(CoordinatorError::InvalidRoster(format!(
                    "missing secret for {}",
                    entry.address
                )));
            }
            let normalized = normalize_address(&entry.address);
            if !seen.insert(normalized.clone()) {
                return Err(CoordinatorError::InvalidRoster(format!(
                    "duplicate member {}",
                    normalized
                )));
            }
            members.push(CouncilMember {
                address: normalized,
                secret_share: entry.secret.clone(),
                commitment: member_commitment(&address, &entry.secret),
            });
        }

        let leaves = members.iter().map(|member| member.commitment).collect();
        let tree = CommitteeTree::new(leaves)
            .map_err(|e| CoordinatorError::InvalidRoster(e.to_string()))?;
        Ok(Council { members, tree })
    }

    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    pub fn members(&self) -> &[CouncilMember] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Leaf index of `address`, compared case-insensitively.
    pub fn position(&self, address: &str) -> Option<usize> {
        let address = normalize_address(address);
        self.members.iter().position(|member| member.address == address)
    }

    pub fn is_member(&self, address: &str) -> bool {
        self.position(address).is_some()
    }

    pub fn path(&self, leaf_index: usize) -> CoordinatorResult<MerklePath> {
        self.tree
            .proof(leaf_index)
            .map_err(|e| CoordinatorError::NotAMember(e.to_string()))
    }

    pub fn membership_proof(&self, address: &str) -> CoordinatorResult<MembershipProofDto> {
        let index = self
            .position(address)
            .ok_or_else(|| CoordinatorError::NotAMember(address.to_string()))?;
        let member = &self.members[index];
        Ok(MembershipProofDto {
            address: member.address.clone(),
            commitment: member.commitment,
            root: self.root(),
            path: self.path(index)?,
        })
    }
}

/// Holder of the current roster epoch.
///
/// A replacement council is built outside the lock and swapped in whole, so
/// readers see either the old tree or the new one.
#[derive(Default)]
pub struct CommitteeRegistry {
    council: RwLock<Option<Arc<Council>>>,
}

impl CommitteeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn setup_council(
        &self,
        roster: &[MemberSecretDto],
    ) -> CoordinatorResult<CouncilSummaryDto> {
        let council = Arc::new(Council::build(roster)?);
        let summary = CouncilSummaryDto {
            root: council.root(),
            member_count: council.member_count(),
        };
        *self.council.write().await = Some(council);
        log::info!(
            "Council replaced: {} members, root {}",
            summary.member_count,
            summary.root
        );
        Ok(summary)
    }

    pub async fn snapshot(&self) -> Option<Arc<Council>> {
        self.council.read().await.clone()
    }

    pub async fn is_member(&self, address: &str) -> bool {
        match self.snapshot().await {
            Some(council) => council.is_member(address),
            None => false,
        }
    }

    pub async fn membership_proof(&self, address: &str) -> CoordinatorResult<MembershipProofDto> {
        match self.snapshot().await {
            Some(council) => council.membership_proof(address),
            None => Err(CoordinatorError::NotAMember(address.to_string())),
        }
    }

    pub async fn current_root(&self) -> Option<B256> {
        self.snapshot().await.map(|council| council.root())
    }

    pub async fn member_count(&self) -> usize {
        self.snapshot()
            .await
            .map(|council| council.member_count())
            .unwrap_or(0)
    }
}
