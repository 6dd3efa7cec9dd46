pub mod council_entity;
pub mod proof_entity;
pub mod vote_entity;
