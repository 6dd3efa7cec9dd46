pub mod chain_publisher;
pub mod committee_registry;
pub mod coordinator_service;
pub mod proof_compiler;
pub mod proving_backend;
pub mod verifier_contract;
pub mod vote_ledger;
