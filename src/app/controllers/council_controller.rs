use actix_web::{get, post, web, HttpResponse};

use crate::app::dtos::council_dto::SetupCouncilDto;
use crate::app::errors::CoordinatorError;
use crate::app::services::coordinator_service::CoordinatorService;

#[get("/council")]
async fn get_council(service: web::Data<CoordinatorService>) -> HttpResponse {
    HttpResponse::Ok().json(service.council().await)
}

/// Replace the council roster
///
/// ```not_rust
/// POST /council/setup
/// Content-Type: application/json
/// ```
///
/// # Request Body
///
/// ```json
/// {
///     "members": [
///         { "address": "0x…", "secret": "…" }
///     ]
/// }
/// ```
///
/// The whole roster and its tree are replaced; there is no partial update.
///
/// # Response
///
/// ## Success (200 OK)
///
/// ```json
/// { "root": "0x…", "memberCount": 5 }
/// ```
///
/// ## 400 Bad Request
///
/// Empty roster, more members than circuit slots, malformed or repeated
/// addresses, or missing secrets.
#[post("/council/setup")]
async fn setup_council(
    service: web::Data<CoordinatorService>,
    body: web::Json<SetupCouncilDto>,
) -> Result<HttpResponse, CoordinatorError> {
    let summary = service.setup_council(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/council/proof/{address}")]
async fn membership_proof(
    service: web::Data<CoordinatorService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoordinatorError> {
    let address = path.into_inner();
    let proof = service.membership_proof(&address).await?;
    Ok(HttpResponse::Ok().json(proof))
}
