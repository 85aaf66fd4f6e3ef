//! Cycle runner.
//!
//! One farming cycle: report balances, swap, wait, add liquidity. The
//! cycle completes only if both transactions succeed; the first error
//! aborts it and is returned to the retry controller.

use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use super::balance::formatted_balance;
use super::liquidity::{execute_provision, plan_provision, LiquidityPlan};
use super::swap::perform_swap;
use crate::chain::{ChainClient, ChainError};
use crate::config::{ProtocolConfig, TimingConfig};
use crate::console;
use crate::session::Session;
use crate::types::{format_micro, CycleReceipt};

/// Something that can run the cycle at a given 1-based index.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self, index: u32) -> Result<CycleReceipt, ChainError>;
}

/// The swap → liquidity cycle against the router.
pub struct FarmingCycle<'a, C> {
    session: &'a Session<C>,
    protocol: &'a ProtocolConfig,
    timing: &'a TimingConfig,
    swap_amount_micro: u128,
}

impl<'a, C: ChainClient> FarmingCycle<'a, C> {
    pub fn new(
        session: &'a Session<C>,
        protocol: &'a ProtocolConfig,
        timing: &'a TimingConfig,
        swap_amount_micro: u128,
    ) -> Self {
        Self {
            session,
            protocol,
            timing,
            swap_amount_micro,
        }
    }

    async fn report_balances(&self) {
        console::info("Checking wallet balance...");
        let client = &self.session.client;
        let address = self.session.address();
        let base = &self.protocol.base;
        let counter = &self.protocol.counter;

        let base_balance = formatted_balance(client, address, &base.denom, &base.symbol).await;
        let counter_balance =
            formatted_balance(client, address, &counter.denom, &counter.symbol).await;

        console::success(&format!("Balance: {base_balance}, {counter_balance}"));
    }

    async fn swap(&self, index: u32) -> Result<String, ChainError> {
        let amount = format_micro(self.swap_amount_micro, &self.protocol.base.symbol);
        console::info(&format!("[1/2] Executing swap for {amount}..."));

        let tx = perform_swap(
            &self.session.client,
            self.session.address(),
            self.swap_amount_micro,
            self.protocol,
        )
        .await
        .inspect_err(|_| console::failure("Swap failed."))?;

        console::success("Swap successful!");
        console::success(&format!("> Explorer: {}", self.protocol.explorer_link(&tx)));
        info!(cycle = index, tx = %tx, amount = self.swap_amount_micro, "Swap executed");
        Ok(tx)
    }

    async fn add_liquidity(&self, index: u32) -> Result<String, ChainError> {
        let base_amount = self.protocol.lp_base_amount.u128();
        console::info(&format!(
            "[2/2] Adding liquidity (simulating pool ratio for {})...",
            format_micro(base_amount, &self.protocol.base.symbol)
        ));

        let client = &self.session.client;
        let address = self.session.address();

        let plan = plan_provision(client, address, self.protocol)
            .await
            .inspect_err(|_| console::failure("Adding liquidity failed."))?;

        let (required, clamp) = plan_lines(&plan, &self.protocol.counter.symbol);
        console::info(&required);
        if let Some(clamp) = clamp {
            console::notice(&clamp);
        }

        let tx = execute_provision(client, address, self.protocol, &plan)
            .await
            .inspect_err(|_| console::failure("Adding liquidity failed."))?;

        console::success("Liquidity added successfully!");
        console::success(&format!("> Explorer: {}", self.protocol.explorer_link(&tx)));
        info!(
            cycle = index,
            tx = %tx,
            required = plan.required,
            supplied = plan.supplied,
            "Liquidity provided"
        );
        Ok(tx)
    }
}

/// The required-amount line and, when the deposit was capped, the notice
/// naming what is actually supplied.
fn plan_lines(plan: &LiquidityPlan, symbol: &str) -> (String, Option<String>) {
    let required = format!("Required: {}", format_micro(plan.required, symbol));
    let clamp = plan.clamped().then(|| {
        format!(
            "Insufficient {symbol}: {} available. Used available amount.",
            format_micro(plan.supplied, symbol)
        )
    });
    (required, clamp)
}

#[async_trait]
impl<'a, C: ChainClient> CycleRunner for FarmingCycle<'a, C> {
    async fn run_cycle(&self, index: u32) -> Result<CycleReceipt, ChainError> {
        let started = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        console::cycle_header(index, &started);

        self.report_balances().await;

        let swap_tx = self.swap(index).await?;

        let delay = self.timing.step_delay();
        console::info(&format!("Waiting for {} seconds...", delay.as_secs()));
        tokio::time::sleep(delay).await;
        console::success("Wait complete.");

        let liquidity_tx = self.add_liquidity(index).await?;

        console::success(&format!("\nCycle #{index} completed successfully!"));
        Ok(CycleReceipt {
            index,
            swap_tx,
            liquidity_tx,
        })
    }
}
