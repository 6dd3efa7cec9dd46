use async_trait::async_trait;

use crate::app::entities::vote_entity::{BallotKey, Vote, VoteCount};

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    /// First write already happened for this key.
    Duplicate(String),
    InternalError(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Item not found"),
            RepositoryError::Duplicate(key) => write!(f, "Key already exists: {}", key),
            RepositoryError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Keyed vote storage.
///
/// Votes live under `"{bundleId}:{proposalId}:{voterAddress}"`, aggregates
/// under `"count:{bundleId}:{proposalId}"`.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Stores `vote` if its key is unused and bumps the aggregate, returning
    /// the aggregate after the increment. Fails with
    /// [`RepositoryError::Duplicate`] without touching either record when the
    /// key is taken.
    async fn insert_vote(&self, vote: &Vote) -> RepositoryResult<VoteCount>;

    async fn contains_vote(&self, key: &str) -> RepositoryResult<bool>;

    async fn find_votes(&self, ballot: BallotKey) -> RepositoryResult<Vec<Vote>>;

    /// Zero counts when nothing was recorded for `ballot`.
    async fn find_count(&self, ballot: BallotKey) -> RepositoryResult<VoteCount>;

    async fn find_all_counts(&self) -> RepositoryResult<Vec<(BallotKey, VoteCount)>>;

    /// Overwrites the aggregate without looking at the stored votes.
    async fn replace_count(&self, ballot: BallotKey, count: VoteCount) -> RepositoryResult<()>;

    /// Replays the stored votes of `ballot` into its aggregate as one atomic
    /// step against concurrent [`VoteStore::insert_vote`] calls. Returns the
    /// aggregate found before the rebuild and the rebuilt one.
    async fn rebuild_count(&self, ballot: BallotKey) -> RepositoryResult<(VoteCount, VoteCount)>;
}
