pub mod council_dto;
pub mod health_dto;
pub mod proof_dto;
pub mod vote_dto;
pub mod witness_dto;
