use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::traits::{RepositoryError, RepositoryResult, VoteStore};
use crate::app::entities::vote_entity::{BallotKey, Vote, VoteCount};

#[derive(Default)]
struct Tables {
    votes: HashMap<String, Vote>,
    counts: HashMap<String, (BallotKey, VoteCount)>,
}

/// Process-local store. One lock covers the dedup check, the vote insert and
/// the count increment.
#[derive(Default)]
pub struct MemoryVoteStore {
    tables: Mutex<Tables>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn insert_vote(&self, vote: &Vote) -> RepositoryResult<VoteCount> {
        let key = vote.ledger_key();
        let mut tables = self.tables.lock().await;
        if tables.votes.contains_key(&key) {
            return Err(RepositoryError::Duplicate(key));
        }
        tables.votes.insert(key, vote.clone());

        let ballot = vote.ballot();
        let entry = tables
            .counts
            .entry(ballot.count_key())
            .or_insert((ballot, VoteCount::default()));
        entry.1.record(vote);
        Ok(entry.1)
    }

    async fn contains_vote(&self, key: &str) -> RepositoryResult<bool> {
        Ok(self.tables.lock().await.votes.contains_key(key))
    }

    async fn find_votes(&self, ballot: BallotKey) -> RepositoryResult<Vec<Vote>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .votes
            .values()
            .filter(|vote| vote.ballot() == ballot)
            .cloned()
            .collect())
    }

    async fn find_count(&self, ballot: BallotKey) -> RepositoryResult<VoteCount> {
        let tables = self.tables.lock().await;
        Ok(tables
            .counts
            .get(&ballot.count_key())
            .map(|(_, count)| *count)
            .unwrap_or_default())
    }

    async fn find_all_counts(&self) -> RepositoryResult<Vec<(BallotKey, VoteCount)>> {
        let tables = self.tables.lock().await;
        Ok(tables.counts.values().copied().collect())
    }

    async fn replace_count(&self, ballot: BallotKey, count: VoteCount) -> RepositoryResult<()> {
        let mut tables = self.tables.lock().await;
        tables.counts.insert(ballot.count_key(), (ballot, count));
        Ok(())
    }

    async fn rebuild_count(&self, ballot: BallotKey) -> RepositoryResult<(VoteCount, VoteCount)> {
        let mut tables = self.tables.lock().await;
        let rebuilt = VoteCount::replay(tables.votes.values().filter(|vote| vote.ballot() == ballot));
        let key = ballot.count_key();
        if rebuilt.total() == 0 && !tables.counts.contains_key(&key) {
            return Ok((VoteCount::default(), rebuilt));
        }
        let previous = tables
            .counts
            .insert(key, (ballot, rebuilt))
            .map(|(_, count)| count)
            .unwrap_or_default();
        Ok((previous, rebuilt))
    }
}
