use actix_web::{get, web, HttpResponse};

use crate::app::errors::CoordinatorError;
use crate::app::services::coordinator_service::CoordinatorService;

/// Liveness plus a summary of the coordinator's state
///
/// ```not_rust
/// GET /health
/// ```
///
/// ```json
/// {
///     "status": "ok",
///     "councilRoot": "0x…",
///     "memberCount": 5,
///     "pendingBundles": 2,
///     "quorum": 3,
///     "autoPublish": false,
///     "chainPublisher": true,
///     "teeAttestation": false
/// }
/// ```
///
/// `councilRoot` is `null` until a council has been set up.
#[get("/health")]
async fn health(service: web::Data<CoordinatorService>) -> Result<HttpResponse, CoordinatorError> {
    let health = service.health().await?;
    Ok(HttpResponse::Ok().json(health))
}
