use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io::{Error, ErrorKind};
use std::sync::Arc;

use council_attest::app;
use council_attest::app::config::{init_mongo, Settings};
use council_attest::app::repository::{
    memory_vote_store::MemoryVoteStore, mongo_vote_store::MongoVoteStore, traits::VoteStore,
};
use council_attest::app::services::coordinator_service::{CoordinatorOptions, CoordinatorService};
use council_attest::app::services::proving_backend::{HttpProvingBackend, ProvingBackend};
use council_attest::app::services::verifier_contract::{JsonRpcVerifier, VerifierContract};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let settings = Settings::from_env()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?;

    let store: Arc<dyn VoteStore> = match &settings.mongo_uri {
        Some(uri) => {
            let client = init_mongo(uri)
                .await
                .map_err(|e| Error::new(ErrorKind::Other, format!("Failed to connect to MongoDB: {}", e)))?;
            log::info!("Using MongoDB database {}", settings.mongo_database);
            Arc::new(MongoVoteStore::new(&client.database(&settings.mongo_database)))
        }
        None => {
            log::warn!("MONGO_URI is not set, votes are kept in memory only");
            Arc::new(MemoryVoteStore::new())
        }
    };

    let backend: Arc<dyn ProvingBackend> = Arc::new(HttpProvingBackend::new(
        &settings.prover_url,
        settings.prover_timeout,
    ));

    let contract: Option<Arc<dyn VerifierContract>> = match &settings.chain {
        Some(chain) => {
            log::info!("Publishing to verifier {} via {}", chain.verifier_address, chain.rpc_url);
            Some(Arc::new(JsonRpcVerifier::new(
                &chain.rpc_url,
                chain.verifier_address,
                chain.signer_address,
                chain.timeout,
            )))
        }
        None => {
            log::warn!("Chain publishing disabled: RPC_URL, VERIFIER_ADDRESS and SIGNER_ADDRESS are not set");
            None
        }
    };

    let options = CoordinatorOptions {
        quorum_threshold: settings.quorum_threshold,
        auto_publish: settings.auto_publish,
        tee_attestation: settings.tee_attestation,
    };
    if settings.tee_attestation {
        log::info!("TEE attestation flag is set (advisory)");
    }
    let service = web::Data::new(CoordinatorService::new(store, backend, contract, options));

    let cors_origin = settings.cors_origin.clone();
    log::info!(
        "Council coordinator listening on {} (quorum {}, auto-publish {})",
        settings.bind_addr,
        settings.quorum_threshold,
        settings.auto_publish
    );
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Content-Type", "Origin", "Accept"])
                .max_age(3600),
            None => Cors::default(),
        };

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(service.clone())
            .configure(app::init::initialize)
    })
    .bind(&settings.bind_addr)?
    .run()
    .await
}
