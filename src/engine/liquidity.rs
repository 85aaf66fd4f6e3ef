//! Liquidity executor.
//!
//! Simulates the router for the fixed base amount to learn how much of the
//! counter asset a balanced deposit needs, caps that at the held balance,
//! then provides both assets.

use tracing::{debug, warn};

use super::to_json;
use crate::chain::{ChainClient, ChainError, Funds};
use crate::config::ProtocolConfig;
use crate::router::{Asset, ExecuteMsg, QueryMsg, SimulationResponse};

/// Counter-asset amounts for one liquidity provision, decided before
/// anything is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityPlan {
    /// Counter-asset amount the simulation asked for.
    pub required: u128,
    /// Counter-asset amount that will be supplied.
    pub supplied: u128,
}

impl LiquidityPlan {
    /// Whether the deposit was reduced to the held balance.
    pub fn clamped(&self) -> bool {
        self.supplied < self.required
    }
}

/// Never request more than is held.
pub fn clamp_to_available(required: u128, available: u128) -> u128 {
    required.min(available)
}

/// Counter-asset amount the router pairs with the fixed base amount.
pub async fn simulate_required<C>(client: &C, protocol: &ProtocolConfig) -> Result<u128, ChainError>
where
    C: ChainClient + ?Sized,
{
    let query = QueryMsg::Simulation {
        offer_asset: Asset::native(&protocol.base.denom, protocol.lp_base_amount),
    };

    let value = client
        .query_smart(&protocol.router_contract, to_json(&query)?)
        .await?;
    let response: SimulationResponse = serde_json::from_value(value)
        .map_err(|e| ChainError::Decode(format!("simulation response: {e}")))?;

    Ok(response.return_amount.u128())
}

/// Simulate the pool ratio and cap the counter amount at the held balance.
pub async fn plan_provision<C>(
    client: &C,
    sender: &str,
    protocol: &ProtocolConfig,
) -> Result<LiquidityPlan, ChainError>
where
    C: ChainClient + ?Sized,
{
    let required = simulate_required(client, protocol).await?;
    let available = client.balance(sender, &protocol.counter.denom).await?;
    let plan = LiquidityPlan {
        required,
        supplied: clamp_to_available(required, available),
    };

    if plan.clamped() {
        warn!(
            required,
            available,
            denom = %protocol.counter.denom,
            "Counter-asset balance below simulated requirement, supplying what is held"
        );
    }
    Ok(plan)
}

/// Submit `provide_liquidity` for `plan` and the fixed base amount.
pub async fn execute_provision<C>(
    client: &C,
    sender: &str,
    protocol: &ProtocolConfig,
    plan: &LiquidityPlan,
) -> Result<String, ChainError>
where
    C: ChainClient + ?Sized,
{
    let counter = &protocol.counter.denom;
    let base = &protocol.base.denom;
    let base_amount = protocol.lp_base_amount.u128();

    let msg = ExecuteMsg::ProvideLiquidity {
        assets: vec![
            Asset::native(counter, plan.supplied),
            Asset::native(base, base_amount),
        ],
        slippage_tolerance: Some(protocol.lp_slippage_tolerance),
    };
    let funds = vec![
        Funds::new(counter, plan.supplied),
        Funds::new(base, base_amount),
    ];

    debug!(supplied = plan.supplied, base_amount, "Submitting provide_liquidity");
    client
        .execute(sender, &protocol.router_contract, to_json(&msg)?, funds)
        .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
