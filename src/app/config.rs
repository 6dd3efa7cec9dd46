use alloy_primitives::Address;
use mongodb::{options::ClientOptions, Client};
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::app::utils::field_helper::parse_address;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("chain publishing needs RPC_URL, VERIFIER_ADDRESS and SIGNER_ADDRESS together; missing {0}")]
    IncompleteChain(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub verifier_address: Address,
    pub signer_address: Address,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub quorum_threshold: u64,
    pub auto_publish: bool,
    /// Advisory only; reported by `/health`.
    pub tee_attestation: bool,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub prover_url: String,
    pub prover_timeout: Duration,
    pub chain: Option<ChainSettings>,
    pub cors_origin: Option<String>,
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_chain_address(key: &'static str, value: &str) -> Result<Address, ConfigError> {
    parse_address(value).ok_or_else(|| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: "expected a 0x-prefixed 20-byte address".to_string(),
    })
}

impl Settings {
    /// Reads settings from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let quorum_threshold = match lookup("QUORUM_THRESHOLD") {
            Some(value) => parse_u64("QUORUM_THRESHOLD", &value)?,
            None => 3,
        };
        if quorum_threshold == 0 {
            return Err(ConfigError::Invalid {
                key: "QUORUM_THRESHOLD",
                value: "0".to_string(),
                reason: "quorum must be at least 1".to_string(),
            });
        }

        let auto_publish = match lookup("AUTO_PUBLISH") {
            Some(value) => parse_bool("AUTO_PUBLISH", &value)?,
            None => false,
        };
        let tee_attestation = match lookup("TEE_ATTESTATION") {
            Some(value) => parse_bool("TEE_ATTESTATION", &value)?,
            None => false,
        };
        let prover_timeout = match lookup("PROVER_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_u64("PROVER_TIMEOUT_SECS", &value)?),
            None => Duration::from_secs(120),
        };
        let chain_timeout = match lookup("CHAIN_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_u64("CHAIN_TIMEOUT_SECS", &value)?),
            None => Duration::from_secs(60),
        };

        let chain = match (
            lookup("RPC_URL"),
            lookup("VERIFIER_ADDRESS"),
            lookup("SIGNER_ADDRESS"),
        ) {
            (None, None, None) => None,
            (Some(rpc_url), Some(verifier), Some(signer)) => Some(ChainSettings {
                rpc_url,
                verifier_address: parse_chain_address("VERIFIER_ADDRESS", &verifier)?,
                signer_address: parse_chain_address("SIGNER_ADDRESS", &signer)?,
                timeout: chain_timeout,
            }),
            (None, _, _) => return Err(ConfigError::IncompleteChain("RPC_URL")),
            (_, None, _) => return Err(ConfigError::IncompleteChain("VERIFIER_ADDRESS")),
            (_, _, None) => return Err(ConfigError::IncompleteChain("SIGNER_ADDRESS")),
        };

        Ok(Settings {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            quorum_threshold,
            auto_publish,
            tee_attestation,
            mongo_uri: lookup("MONGO_URI"),
            mongo_database: lookup("MONGO_DATABASE").unwrap_or_else(|| "council".to_string()),
            prover_url: lookup("PROVER_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8081/prove".to_string()),
            prover_timeout,
            chain,
            cors_origin: lookup("CORS_ORIGIN"),
        })
    }
}

pub async fn init_mongo(uri: &str) -> mongodb::error::Result<Client> {
    let client_options = ClientOptions::parse(uri).await?;
    Client::with_options(client_options)
}
