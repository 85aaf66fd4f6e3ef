//! Session initialization.
//!
//! Resolves the two required secrets, derives the single farming account
//! and connects the signing client. Every failure here is fatal for the
//! run; nothing is retried.

use secrecy::SecretString;
use tracing::{error, info};

use crate::chain::zigchain::{Signer, ZigChainClient};
use crate::chain::{ChainClient, ChainError};
use crate::config::{AppConfig, ChainConfig, CredentialsConfig};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} must be provided")]
    MissingCredential(String),

    #[error("failed to derive account: {0}")]
    Derivation(#[source] ChainError),

    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: ChainError,
    },
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// RPC endpoint and recovery phrase for the run.
pub struct Credentials {
    rpc_endpoint: String,
    mnemonic: SecretString,
}

impl Credentials {
    /// Build from raw values. Absent and blank values are both rejected.
    pub fn new(
        rpc_endpoint: Option<String>,
        mnemonic: Option<String>,
    ) -> Result<Self, SessionError> {
        let mnemonic = mnemonic
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| SessionError::MissingCredential("Mnemonic".into()))?;
        let rpc_endpoint = rpc_endpoint
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| SessionError::MissingCredential("RPC endpoint".into()))?;

        Ok(Self {
            rpc_endpoint,
            mnemonic: SecretString::new(mnemonic),
        })
    }

    /// Read the configured environment variables.
    pub fn from_env(config: &CredentialsConfig) -> Result<Self, SessionError> {
        Self::new(
            AppConfig::resolve_env(&config.rpc_endpoint_env),
            AppConfig::resolve_env(&config.mnemonic_env),
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("mnemonic", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: String,
}

/// The one account/client pair used for the whole run.
pub struct Session<C> {
    pub account: Account,
    pub client: C,
}

impl<C: ChainClient> Session<C> {
    pub fn new(address: impl Into<String>, client: C) -> Self {
        Self {
            account: Account {
                address: address.into(),
            },
            client,
        }
    }

    pub fn address(&self) -> &str {
        &self.account.address
    }
}

/// Derive the account and connect to the node.
pub async fn initialize(
    credentials: &Credentials,
    chain: &ChainConfig,
) -> Result<Session<ZigChainClient>, SessionError> {
    let signer = Signer::from_mnemonic(&credentials.mnemonic, &chain.address_prefix)
        .map_err(SessionError::Derivation)?;
    let address = signer.address().to_string();

    let client = ZigChainClient::connect(&credentials.rpc_endpoint, signer, chain)
        .await
        .map_err(|source| {
            error!(endpoint = %credentials.rpc_endpoint, error = %source, "Connection failed");
            SessionError::Connect {
                endpoint: credentials.rpc_endpoint.clone(),
                source,
            }
        })?;

    info!(address = %address, chain_id = %client.chain_id(), "Session initialized");
    Ok(Session::new(address, client))
}
