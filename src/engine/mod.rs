//! Farming engine: the balance → swap → liquidity cycle and the retry
//! loop around it.

pub mod balance;
pub mod cycle;
pub mod liquidity;
pub mod retry;
pub mod swap;

use serde::Serialize;
use serde_json::Value;

use crate::chain::ChainError;

/// Serialize a router message for `ChainClient`.
pub(crate) fn to_json<T: Serialize>(msg: &T) -> Result<Value, ChainError> {
    serde_json::to_value(msg).map_err(|e| ChainError::Encode(format!("router message: {e}")))
}
