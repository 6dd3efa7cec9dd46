use crate::app::controllers::{
    council_controller, health_controller, proof_controller, vote_controller,
};
use actix_web::web;

pub fn setup_routes(cfg: &mut web::ServiceConfig) -> &mut web::ServiceConfig {
    cfg.service(health_controller::health)
        .service((
            council_controller::get_council,
            council_controller::setup_council,
            council_controller::membership_proof,
        ))
        .service((
            vote_controller::cast_vote,
            vote_controller::recount,
            vote_controller::vote_status,
            vote_controller::has_voted,
            vote_controller::pending_bundles,
        ))
        .service((
            proof_controller::generate_proof,
            proof_controller::publish_proof,
            proof_controller::proof_status,
        ))
}
