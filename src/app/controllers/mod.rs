pub mod council_controller;
pub mod health_controller;
pub mod proof_controller;
pub mod vote_controller;
