use actix_web::{get, post, web, HttpResponse};

use crate::app::dtos::proof_dto::{GenerateProofDto, ProofStatusDto, PublishProofDto};
use crate::app::errors::CoordinatorError;
use crate::app::services::coordinator_service::CoordinatorService;

/// Compile a quorum proof on demand
///
/// ```not_rust
/// POST /proof/generate
/// Content-Type: application/json
///
/// { "bundleId": 1, "proposalId": 5 }
/// ```
///
/// Returns the prover's proof and public signals together with
/// `formattedProof`, the `(a, b, c)` tuple the verifier contract takes.
/// 404 when no votes exist for the ballot, 400 when quorum is not met.
#[post("/proof/generate")]
async fn generate_proof(
    service: web::Data<CoordinatorService>,
    body: web::Json<GenerateProofDto>,
) -> Result<HttpResponse, CoordinatorError> {
    let request = body.into_inner();
    let generated = service
        .generate_proof_response(request.bundle_id, request.proposal_id)
        .await?;
    Ok(HttpResponse::Ok().json(generated))
}

#[post("/proof/publish")]
async fn publish_proof(
    service: web::Data<CoordinatorService>,
    body: web::Json<PublishProofDto>,
) -> Result<HttpResponse, CoordinatorError> {
    let outcome = service.publish_proof(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/proof/status/{bundle_id}/{proposal_id}")]
async fn proof_status(
    service: web::Data<CoordinatorService>,
    path: web::Path<(u64, u64)>,
) -> Result<HttpResponse, CoordinatorError> {
    let (bundle_id, proposal_id) = path.into_inner();
    let verified = service.has_verified_proof(bundle_id, proposal_id).await?;
    Ok(HttpResponse::Ok().json(ProofStatusDto {
        bundle_id,
        proposal_id,
        verified,
    }))
}
