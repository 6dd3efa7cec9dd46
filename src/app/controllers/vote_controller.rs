use actix_web::{get, post, web, HttpResponse};

use crate::app::dtos::vote_dto::{CastVoteDto, HasVotedDto};
use crate::app::errors::CoordinatorError;
use crate::app::services::coordinator_service::CoordinatorService;

/// Cast a council member's vote
///
/// ```not_rust
/// POST /vote
/// Content-Type: application/json
/// ```
///
/// # Request Body
///
/// ```json
/// {
///     "bundleId": 1,
///     "proposalId": 5,
///     "voterAddress": "0x…",
///     "vote": 1,
///     "signature": "0x…",
///     "nullifier": "0x…"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
///
/// ```json
/// {
///     "success": true,
///     "quorumReached": true,
///     "voteCount": { "approvals": 3, "rejections": 1 },
///     "proof": ["3", "3", "…"],
///     "txHash": "0x…"
/// }
/// ```
///
/// `proof` holds the public signals and is only present on the vote that
/// brought the ballot to quorum; `txHash` only when auto-publish sent a
/// transaction.
///
/// ## Error Responses
///
/// - 400: missing or malformed fields, or a second vote from the same member
/// - 403: the voter is not on the current council
#[post("/vote")]
async fn cast_vote(
    service: web::Data<CoordinatorService>,
    body: web::Json<CastVoteDto>,
) -> Result<HttpResponse, CoordinatorError> {
    let outcome = service.submit_vote(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/votes/{bundle_id}/{proposal_id}")]
async fn vote_status(
    service: web::Data<CoordinatorService>,
    path: web::Path<(u64, u64)>,
) -> Result<HttpResponse, CoordinatorError> {
    let (bundle_id, proposal_id) = path.into_inner();
    let status = service.vote_status(bundle_id, proposal_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

#[get("/votes/{bundle_id}/{proposal_id}/{voter_address}")]
async fn has_voted(
    service: web::Data<CoordinatorService>,
    path: web::Path<(u64, u64, String)>,
) -> Result<HttpResponse, CoordinatorError> {
    let (bundle_id, proposal_id, voter_address) = path.into_inner();
    let has_voted = service
        .ledger()
        .has_voted(bundle_id, proposal_id, &voter_address)
        .await?;
    Ok(HttpResponse::Ok().json(HasVotedDto { has_voted }))
}

/// Rebuilds the stored tally from the recorded votes.
#[post("/votes/{bundle_id}/{proposal_id}/recount")]
async fn recount(
    service: web::Data<CoordinatorService>,
    path: web::Path<(u64, u64)>,
) -> Result<HttpResponse, CoordinatorError> {
    let (bundle_id, proposal_id) = path.into_inner();
    let status = service.recount(bundle_id, proposal_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

#[get("/bundles/pending")]
async fn pending_bundles(service: web::Data<CoordinatorService>) -> Result<HttpResponse, CoordinatorError> {
    let pending = service.pending_bundles().await?;
    Ok(HttpResponse::Ok().json(pending))
}
