use serde::{Deserialize, Serialize};

pub const APPROVE: u8 = 1;
pub const REJECT: u8 = 0;

/// A council member's ballot on one proposal of a bundle. Immutable once recorded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    #[serde(rename = "bundleId")]
    pub bundle_id: u64,

    #[serde(rename = "proposalId")]
    pub proposal_id: u64,

    #[serde(rename = "voterAddress")]
    pub voter_address: String,

    #[serde(rename = "vote")]
    pub vote: u8,

    #[serde(rename = "signature")]
    pub signature: String,

    #[serde(rename = "nullifier")]
    pub nullifier: String,

    /// Unix milliseconds at which the ledger accepted the vote.
    #[serde(rename = "timestamp")]
    pub timestamp: i64,
}

impl Vote {
    pub fn is_approval(&self) -> bool {
        self.vote == APPROVE
    }

    pub fn ballot(&self) -> BallotKey {
        BallotKey::new(self.bundle_id, self.proposal_id)
    }

    pub fn ledger_key(&self) -> String {
        vote_key(self.bundle_id, self.proposal_id, &self.voter_address)
    }
}

/// A `(bundleId, proposalId)` pair.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallotKey {
    #[serde(rename = "bundleId")]
    pub bundle_id: u64,

    #[serde(rename = "proposalId")]
    pub proposal_id: u64,
}

impl BallotKey {
    pub fn new(bundle_id: u64, proposal_id: u64) -> Self {
        BallotKey {
            bundle_id,
            proposal_id,
        }
    }

    pub fn count_key(&self) -> String {
        format!("count:{}:{}", self.bundle_id, self.proposal_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCount {
    #[serde(rename = "approvals")]
    pub approvals: u64,

    #[serde(rename = "rejections")]
    pub rejections: u64,
}

impl VoteCount {
    pub fn total(&self) -> u64 {
        self.approvals + self.rejections
    }

    pub fn record(&mut self, vote: &Vote) {
        if vote.is_approval() {
            self.approvals += 1;
        } else {
            self.rejections += 1;
        }
    }

    /// Tally obtained by replaying `votes`.
    pub fn replay<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        let mut count = VoteCount::default();
        for vote in votes {
            count.record(vote);
        }
        count
    }
}

/// `"{bundleId}:{proposalId}:{voterAddress}"` with the address lowercased.
pub fn vote_key(bundle_id: u64, proposal_id: u64, voter_address: &str) -> String {
    format!(
        "{}:{}:{}",
        bundle_id,
        proposal_id,
        voter_address.trim().to_lowercase()
    )
}
