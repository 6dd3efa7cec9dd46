use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::app::repository::traits::RepositoryError;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("{0} is not a council member")]
    NotAMember(String),

    #[error("{voter} already voted on bundle {bundle_id} proposal {proposal_id}")]
    DuplicateVote {
        bundle_id: u64,
        proposal_id: u64,
        voter: String,
    },

    #[error("Quorum not met: {approvals} approvals, {threshold} required")]
    QuorumNotMet { approvals: u64, threshold: u64 },

    #[error("No votes found for bundle {bundle_id} proposal {proposal_id}")]
    NoVotes { bundle_id: u64, proposal_id: u64 },

    #[error("Proving backend failed: {0}")]
    ProofBackend(String),

    #[error("Proving backend timed out")]
    ProofBackendTimeout,

    #[error("Proof for bundle {bundle_id} proposal {proposal_id} is already verified on chain")]
    AlreadyPublished { bundle_id: u64, proposal_id: u64 },

    #[error("A publish for bundle {bundle_id} proposal {proposal_id} is already in flight")]
    PublishInFlight { bundle_id: u64, proposal_id: u64 },

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Chain publisher is not configured")]
    ChainNotConfigured,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoordinatorError {
    fn label(&self) -> &'static str {
        match self {
            CoordinatorError::Validation(_) => "Invalid input",
            CoordinatorError::InvalidRoster(_) => "Invalid roster",
            CoordinatorError::NotAMember(_) => "Not a council member",
            CoordinatorError::DuplicateVote { .. } => "Duplicate vote",
            CoordinatorError::QuorumNotMet { .. } => "Quorum not met",
            CoordinatorError::NoVotes { .. } => "No votes found",
            CoordinatorError::ProofBackend(_) => "Proof generation failed",
            CoordinatorError::ProofBackendTimeout => "Proof generation timed out",
            CoordinatorError::AlreadyPublished { .. } => "Proof already published",
            CoordinatorError::PublishInFlight { .. } => "Publish in progress",
            CoordinatorError::PublishFailed(_) => "Failed to publish proof",
            CoordinatorError::ChainNotConfigured => "Failed to publish proof",
            CoordinatorError::Storage(_) => "Storage failure",
        }
    }
}

impl From<RepositoryError> for CoordinatorError {
    fn from(error: RepositoryError) -> Self {
        CoordinatorError::Storage(error.to_string())
    }
}

impl ResponseError for CoordinatorError {
    fn status_code(&self) -> StatusCode {
        match self {
            CoordinatorError::Validation(_)
            | CoordinatorError::InvalidRoster(_)
            | CoordinatorError::DuplicateVote { .. }
            | CoordinatorError::QuorumNotMet { .. } => StatusCode::BAD_REQUEST,
            CoordinatorError::NotAMember(_) => StatusCode::FORBIDDEN,
            CoordinatorError::NoVotes { .. } => StatusCode::NOT_FOUND,
            CoordinatorError::AlreadyPublished { .. } | CoordinatorError::PublishInFlight { .. } => {
                StatusCode::CONFLICT
            }
            CoordinatorError::ProofBackend(_)
            | CoordinatorError::PublishFailed(_)
            | CoordinatorError::ChainNotConfigured => StatusCode::BAD_GATEWAY,
            CoordinatorError::ProofBackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            CoordinatorError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.label(),
            "error": self.to_string()
        }))
    }
}

/// Turns body deserialization failures into the same JSON shape as other errors.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    let message = err.to_string();
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(json!({
            "message": "Invalid input",
            "error": message
        })),
    )
    .into()
}
