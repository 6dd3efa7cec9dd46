use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::{
    bson::doc,
    error::{CommandError, ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use super::traits::{RepositoryError, RepositoryResult, VoteStore};
use crate::app::entities::vote_entity::{BallotKey, Vote, VoteCount};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Compare-and-swap attempts of a rebuild before giving up on a busy ballot.
const REBUILD_ATTEMPTS: usize = 5;

#[derive(Serialize, Deserialize, Debug)]
struct VoteDocument {
    #[serde(rename = "_id")]
    id: String,

    #[serde(rename = "bundleId")]
    bundle_id: i64,

    #[serde(rename = "proposalId")]
    proposal_id: i64,

    #[serde(rename = "voterAddress")]
    voter_address: String,

    #[serde(rename = "vote")]
    vote: i32,

    #[serde(rename = "signature")]
    signature: String,

    #[serde(rename = "nullifier")]
    nullifier: String,

    #[serde(rename = "timestamp")]
    timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug)]
struct CountDocument {
    #[serde(rename = "_id")]
    id: String,

    #[serde(rename = "bundleId")]
    bundle_id: i64,

    #[serde(rename = "proposalId")]
    proposal_id: i64,

    #[serde(rename = "approvals")]
    approvals: i64,

    #[serde(rename = "rejections")]
    rejections: i64,

    /// Ledger keys of the votes folded into this aggregate.
    #[serde(rename = "voters", default)]
    voters: Vec<String>,
}

fn to_i64(value: u64) -> RepositoryResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepositoryError::InternalError(format!("{} does not fit a BSON int64", value)))
}

fn to_u64(value: i64) -> RepositoryResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::InternalError(format!("negative stored value {}", value)))
}

impl VoteDocument {
    fn from_vote(vote: &Vote) -> RepositoryResult<Self> {
        Ok(VoteDocument {
            id: vote.ledger_key(),
            bundle_id: to_i64(vote.bundle_id)?,
            proposal_id: to_i64(vote.proposal_id)?,
            voter_address: vote.voter_address.clone(),
            vote: i32::from(vote.vote),
            signature: vote.signature.clone(),
            nullifier: vote.nullifier.clone(),
            timestamp: vote.timestamp,
        })
    }

    fn into_vote(self) -> RepositoryResult<Vote> {
        let vote = u8::try_from(self.vote)
            .map_err(|_| RepositoryError::InternalError(format!("corrupt vote bit in {}", self.id)))?;
        Ok(Vote {
            bundle_id: to_u64(self.bundle_id)?,
            proposal_id: to_u64(self.proposal_id)?,
            voter_address: self.voter_address,
            vote,
            signature: self.signature,
            nullifier: self.nullifier,
            timestamp: self.timestamp,
        })
    }
}

impl CountDocument {
    fn ballot(&self) -> RepositoryResult<BallotKey> {
        Ok(BallotKey::new(to_u64(self.bundle_id)?, to_u64(self.proposal_id)?))
    }

    fn count(&self) -> RepositoryResult<VoteCount> {
        Ok(VoteCount {
            approvals: to_u64(self.approvals)?,
            rejections: to_u64(self.rejections)?,
        })
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(CommandError { code, .. }) => *code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn internal(error: mongodb::error::Error) -> RepositoryError {
    RepositoryError::InternalError(error.to_string())
}

/// MongoDB-backed [`VoteStore`].
///
/// The unique `_id` of the `votes` collection makes the first insert win.
/// Aggregates are bumped with a single `$inc` upsert that also records the
/// vote's key in `voters`, so a vote already folded in by a rebuild is never
/// counted a second time.
pub struct MongoVoteStore {
    votes: Collection<VoteDocument>,
    counts: Collection<CountDocument>,
}

impl MongoVoteStore {
    pub fn new(database: &Database) -> Self {
        MongoVoteStore {
            votes: database.collection::<VoteDocument>("votes"),
            counts: database.collection::<CountDocument>("vote_counts"),
        }
    }
}

#[async_trait]
impl VoteStore for MongoVoteStore {
    async fn insert_vote(&self, vote: &Vote) -> RepositoryResult<VoteCount> {
        let document = VoteDocument::from_vote(vote)?;
        let key = document.id.clone();
        match self.votes.insert_one(document, None).await {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => return Err(RepositoryError::Duplicate(key)),
            Err(e) => return Err(internal(e)),
        }

        let ballot = vote.ballot();
        let (approvals, rejections) = if vote.is_approval() {
            (1i64, 0i64)
        } else {
            (0i64, 1i64)
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .counts
            .find_one_and_update(
                doc! { "_id": ballot.count_key(), "voters": { "$ne": key.as_str() } },
                doc! {
                    "$inc": { "approvals": approvals, "rejections": rejections },
                    "$addToSet": { "voters": key.as_str() },
                    "$setOnInsert": {
                        "bundleId": to_i64(ballot.bundle_id)?,
                        "proposalId": to_i64(ballot.proposal_id)?,
                    },
                },
                options,
            )
            .await;

        match updated {
            Ok(Some(document)) => document.count(),
            Ok(None) => Err(RepositoryError::NotFound),
            // a rebuild already folded this vote in
            Err(e) if is_duplicate_key(&e) => self.find_count(ballot).await,
            Err(e) => Err(internal(e)),
        }
    }

    async fn contains_vote(&self, key: &str) -> RepositoryResult<bool> {
        let result = self
            .votes
            .find_one(doc! { "_id": key }, None)
            .await
            .map_err(internal)?;
        Ok(result.is_some())
    }

    async fn find_votes(&self, ballot: BallotKey) -> RepositoryResult<Vec<Vote>> {
        let filter = doc! {
            "bundleId": to_i64(ballot.bundle_id)?,
            "proposalId": to_i64(ballot.proposal_id)?,
        };
        let mut cursor = self.votes.find(filter, None).await.map_err(internal)?;
        let mut votes = Vec::new();
        while let Some(document) = cursor.next().await {
            votes.push(document.map_err(internal)?.into_vote()?);
        }
        Ok(votes)
    }

    async fn find_count(&self, ballot: BallotKey) -> RepositoryResult<VoteCount> {
        let result = self
            .counts
            .find_one(doc! { "_id": ballot.count_key() }, None)
            .await
            .map_err(internal)?;
        match result {
            Some(document) => document.count(),
            None => Ok(VoteCount::default()),
        }
    }

    async fn find_all_counts(&self) -> RepositoryResult<Vec<(BallotKey, VoteCount)>> {
        let mut cursor = self.counts.find(None, None).await.map_err(internal)?;
        let mut counts = Vec::new();
        while let Some(document) = cursor.next().await {
            let document = document.map_err(internal)?;
            counts.push((document.ballot()?, document.count()?));
        }
        Ok(counts)
    }

    async fn replace_count(&self, ballot: BallotKey, count: VoteCount) -> RepositoryResult<()> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.counts
            .update_one(
                doc! { "_id": ballot.count_key() },
                doc! {
                    "$set": {
                        "approvals": to_i64(count.approvals)?,
                        "rejections": to_i64(count.rejections)?,
                    },
                    "$setOnInsert": {
                        "bundleId": to_i64(ballot.bundle_id)?,
                        "proposalId": to_i64(ballot.proposal_id)?,
                    },
                },
                options,
            )
            .await
            .map_err(internal)?;
        Ok(())
    }

    /// Compare-and-swap on the aggregate: the replayed count is only written
    /// if no increment landed since it was read, otherwise the rebuild starts
    /// over.
    async fn rebuild_count(&self, ballot: BallotKey) -> RepositoryResult<(VoteCount, VoteCount)> {
        for _ in 0..REBUILD_ATTEMPTS {
            let current = self
                .counts
                .find_one(doc! { "_id": ballot.count_key() }, None)
                .await
                .map_err(internal)?;
            let votes = self.find_votes(ballot).await?;
            let rebuilt = VoteCount::replay(&votes);
            let voters: Vec<String> = votes.iter().map(Vote::ledger_key).collect();

            match current {
                Some(document) => {
                    let previous = document.count()?;
                    let result = self
                        .counts
                        .update_one(
                            doc! {
                                "_id": ballot.count_key(),
                                "approvals": document.approvals,
                                "rejections": document.rejections,
                            },
                            doc! {
                                "$set": {
                                    "approvals": to_i64(rebuilt.approvals)?,
                                    "rejections": to_i64(rebuilt.rejections)?,
                                    "voters": voters,
                                },
                            },
                            None,
                        )
                        .await
                        .map_err(internal)?;
                    if result.matched_count == 1 {
                        return Ok((previous, rebuilt));
                    }
                }
                None if votes.is_empty() => return Ok((VoteCount::default(), rebuilt)),
                None => {
                    let document = CountDocument {
                        id: ballot.count_key(),
                        bundle_id: to_i64(ballot.bundle_id)?,
                        proposal_id: to_i64(ballot.proposal_id)?,
                        approvals: to_i64(rebuilt.approvals)?,
                        rejections: to_i64(rebuilt.rejections)?,
                        voters,
                    };
                    match self.counts.insert_one(document, None).await {
                        Ok(_) => return Ok((VoteCount::default(), rebuilt)),
                        Err(e) if is_duplicate_key(&e) => {}
                        Err(e) => return Err(internal(e)),
                    }
                }
            }
            log::debug!("Aggregate {} moved during rebuild, retrying", ballot.count_key());
        }
        Err(RepositoryError::InternalError(format!(
            "aggregate {} kept changing during rebuild",
            ballot.count_key()
        )))
    }
}
