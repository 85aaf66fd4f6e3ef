//! Blockchain collaborator.
//!
//! Defines the `ChainClient` trait the farming engine talks to and the
//! ZigChain implementation built on `cosmrs`:
//! - `zigchain`: Tendermint RPC transport, direct-mode signing
//! - `gas`: gas price parsing and fee computation

pub mod gas;
pub mod zigchain;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Codespace used by the Cosmos SDK core modules (bank, auth, ante handler).
pub const SDK_CODESPACE: &str = "sdk";

/// `ErrInsufficientFunds` in the `sdk` codespace.
pub const CODE_INSUFFICIENT_FUNDS: u32 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A native coin attached to a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Funds {
    pub denom: String,
    pub amount: u128,
}

impl Funds {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Funds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Errors surfaced by a `ChainClient`.
///
/// Node-side failures keep the ABCI codespace and code so callers can
/// classify them without parsing log text.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("transaction rejected with code {code} (codespace: {codespace}): {log}")]
    Rejected {
        codespace: String,
        code: u32,
        log: String,
    },

    #[error("query {path} failed with code {code} (codespace: {codespace}): {log}")]
    QueryFailed {
        path: String,
        codespace: String,
        code: u32,
        log: String,
    },

    #[error("transaction {hash} was not included within {timeout_secs}s")]
    Timeout { hash: String, timeout_secs: u64 },

    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("failed to encode {0}")]
    Encode(String),

    #[error("failed to decode {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ChainError {
    /// The `(codespace, code)` pair when the node reported one.
    pub fn abci_code(&self) -> Option<(&str, u32)> {
        match self {
            ChainError::Rejected { codespace, code, .. }
            | ChainError::QueryFailed { codespace, code, .. } => Some((codespace.as_str(), *code)),
            _ => None,
        }
    }
}

impl From<cosmrs::rpc::Error> for ChainError {
    fn from(value: cosmrs::rpc::Error) -> Self {
        ChainError::Transport(value.to_string())
    }
}

impl From<cosmrs::ErrorReport> for ChainError {
    fn from(value: cosmrs::ErrorReport) -> Self {
        ChainError::Signing(value.to_string())
    }
}

impl From<bip32::Error> for ChainError {
    fn from(value: bip32::Error) -> Self {
        ChainError::Signing(value.to_string())
    }
}

impl From<prost::DecodeError> for ChainError {
    fn from(value: prost::DecodeError) -> Self {
        ChainError::Decode(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over a connected, signing blockchain client.
///
/// Contract messages and queries are passed as JSON values; the client
/// owns transport, signing and fee handling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Balance of `address` in `denom`, in micro units.
    async fn balance(&self, address: &str, denom: &str) -> Result<u128, ChainError>;

    /// Execute `msg` on `contract` with `funds` attached.
    /// Returns the transaction hash once the transaction is included.
    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: Value,
        funds: Vec<Funds>,
    ) -> Result<String, ChainError>;

    /// Run a smart query against `contract`.
    async fn query_smart(&self, contract: &str, query: Value) -> Result<Value, ChainError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funds_display() {
        assert_eq!(Funds::new("uzig", 250_000).to_string(), "250000uzig");
    }

    #[test]
    fn test_abci_code_for_rejection() {
        let err = ChainError::Rejected {
            codespace: "sdk".into(),
            code: 5,
            log: "spendable balance 10uzig is smaller than 20uzig: insufficient funds".into(),
        };
        assert_eq!(err.abci_code(), Some(("sdk", 5)));
        assert!(err.to_string().contains("code 5"));
    }

    #[test]
    fn test_key_derivation_error_is_signing() {
        let err: ChainError = "m/44'/not-a-number"
            .parse::<bip32::DerivationPath>()
            .unwrap_err()
            .into();
        assert!(matches!(err, ChainError::Signing(_)));
    }

    #[test]
    fn test_abci_code_absent_for_transport() {
        let err = ChainError::Transport("connection refused".into());
        assert_eq!(err.abci_code(), None);
    }
}
