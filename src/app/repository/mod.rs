pub mod memory_vote_store;
pub mod mongo_vote_store;
pub mod traits;
