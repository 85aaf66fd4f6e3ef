//! Gas price parsing and fee computation.

use rust_decimal::prelude::*;
use std::fmt;
use std::str::FromStr;

/// A price per unit of gas, e.g. `0.025uzig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GasPriceError {
    #[error("invalid gas price {0:?}: expected <amount><denom>, e.g. 0.025uzig")]
    Format(String),
}

impl FromStr for GasPrice {
    type Err = GasPriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| GasPriceError::Format(s.to_string()))?;
        let (amount, denom) = s.split_at(split);

        if amount.is_empty() || denom.len() < 3 {
            return Err(GasPriceError::Format(s.to_string()));
        }
        let amount =
            Decimal::from_str(amount).map_err(|_| GasPriceError::Format(s.to_string()))?;

        Ok(Self {
            amount,
            denom: denom.to_string(),
        })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.denom)
    }
}

impl GasPrice {
    /// Fee for `gas_limit` units, rounded up to a whole micro unit.
    pub fn fee_for(&self, gas_limit: u64) -> u128 {
        (Decimal::from(gas_limit) * self.amount)
            .ceil()
            .to_u128()
            .unwrap_or(u128::MAX)
    }
}

/// Gas limit for a simulated transaction after applying `adjustment`.
pub fn gas_limit(gas_used: u64, adjustment: Decimal) -> u64 {
    (Decimal::from(gas_used) * adjustment)
        .ceil()
        .to_u64()
        .unwrap_or(u64::MAX)
}
