//! Oroswap router messages.
//!
//! Only the pieces the bot sends: `swap`, `provide_liquidity` and the
//! `simulation` query. Amounts serialize as strings, decimals as
//! fixed-point strings, matching the contract's JSON schema.

use cosmwasm_std::{Decimal, Uint128};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetInfo {
    NativeToken { denom: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub info: AssetInfo,
    pub amount: Uint128,
}

impl Asset {
    pub fn native(denom: impl Into<String>, amount: impl Into<Uint128>) -> Self {
        Self {
            info: AssetInfo::NativeToken {
                denom: denom.into(),
            },
            amount: amount.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    Swap {
        offer_asset: Asset,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_spread: Option<Decimal>,
    },
    ProvideLiquidity {
        assets: Vec<Asset>,
        #[serde(skip_serializing_if = "Option::is_none")]
        slippage_tolerance: Option<Decimal>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Simulation { offer_asset: Asset },
}

/// Response to `QueryMsg::Simulation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResponse {
    /// Ask-asset amount the offer would return.
    pub return_amount: Uint128,
    #[serde(default)]
    pub spread_amount: Uint128,
    #[serde(default)]
    pub commission_amount: Uint128,
}
