//! Swap executor.

use tracing::debug;

use super::to_json;
use crate::chain::{ChainClient, ChainError, Funds};
use crate::config::ProtocolConfig;
use crate::router::{Asset, ExecuteMsg};

/// Offer `amount` micro units of the base asset to the router.
///
/// Returns the transaction hash. Errors are passed through untouched.
pub async fn perform_swap<C>(
    client: &C,
    sender: &str,
    amount: u128,
    protocol: &ProtocolConfig,
) -> Result<String, ChainError>
where
    C: ChainClient + ?Sized,
{
    let msg = ExecuteMsg::Swap {
        offer_asset: Asset::native(&protocol.base.denom, amount),
        max_spread: Some(protocol.swap_max_spread),
    };
    let funds = vec![Funds::new(&protocol.base.denom, amount)];

    debug!(amount, denom = %protocol.base.denom, "Submitting swap");
    client
        .execute(sender, &protocol.router_contract, to_json(&msg)?, funds)
        .await
}
