//! Farming runs through `RetryController` and `FarmingCycle` with the
//! mock chain. Time is paused so every wait is observable exactly.

use std::time::Duration;

use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

use oroswap_farmer::chain::{ChainError, Funds};
use oroswap_farmer::config::{ProtocolConfig, RetryConfig, TimingConfig};
use oroswap_farmer::engine::cycle::{CycleRunner, FarmingCycle};
use oroswap_farmer::engine::retry::{ControllerState, RetryController, RetryPolicy};
use oroswap_farmer::session::Session;

use crate::mock_chain::MockChain;

const FARMER: &str = "zig1farmer0000000000000000000000000000000";
const SWAP_AMOUNT: u128 = 250_000;

struct Fixture {
    chain: MockChain,
    session: Session<MockChain>,
    protocol: ProtocolConfig,
    timing: TimingConfig,
}

impl Fixture {
    /// Swaps return 900 counter units; a simulation asks for `required`.
    fn new(required: u128) -> Self {
        let protocol = ProtocolConfig::default();
        let chain = MockChain::new(required, (protocol.counter.denom.as_str(), 900));
        chain.set_balance(FARMER, &protocol.base.denom, 10_000_000);
        Self {
            session: Session::new(FARMER, chain.clone()),
            chain,
            protocol,
            timing: TimingConfig::default(),
        }
    }

    fn cycle(&self) -> FarmingCycle<'_, MockChain> {
        FarmingCycle::new(&self.session, &self.protocol, &self.timing, SWAP_AMOUNT)
    }

    fn controller(&self, retry: &RetryConfig) -> RetryController {
        RetryController::new(RetryPolicy::from_config(&self.timing, retry))
    }

    fn base(&self) -> &str {
        &self.protocol.base.denom
    }

    fn counter(&self) -> &str {
        &self.protocol.counter.denom
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_cycles_alternate_swap_and_liquidity() {
    let fx = Fixture::new(600);
    let start = Instant::now();

    let summary = fx
        .controller(&RetryConfig::default())
        .run(&fx.cycle(), 2)
        .await;

    assert_eq!(summary.final_state, ControllerState::Done);
    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.failed_attempts, 0);
    // step wait, gap between cycles, step wait
    assert_eq!(start.elapsed(), Duration::from_secs(15));

    let executions = fx.chain.executions();
    let actions: Vec<String> = executions.iter().map(|e| e.action()).collect();
    assert_eq!(
        actions,
        ["swap", "provide_liquidity", "swap", "provide_liquidity"]
    );
    assert!(executions
        .iter()
        .all(|e| e.sender == FARMER && e.contract == fx.protocol.router_contract));

    let swap = &executions[0];
    assert_eq!(swap.funds, vec![Funds::new(fx.base(), SWAP_AMOUNT)]);
    assert_eq!(
        swap.msg["swap"]["offer_asset"]["info"]["native_token"]["denom"],
        fx.base()
    );

    let lp = &executions[1];
    assert_eq!(
        lp.funds,
        vec![Funds::new(fx.counter(), 600), Funds::new(fx.base(), 150_000)]
    );

    assert_eq!(summary.receipts[0].swap_tx, executions[0].tx_hash);
    assert_eq!(summary.receipts[1].liquidity_tx, executions[3].tx_hash);

    // two rounds of 250000 swapped and 150000 deposited
    assert_eq!(fx.chain.balance_of(FARMER, fx.base()), 9_200_000);
    assert_eq!(fx.chain.balance_of(FARMER, fx.counter()), 600);
}

#[tokio::test(start_paused = true)]
async fn test_liquidity_is_capped_at_held_counter_balance() {
    let fx = Fixture::new(2_000);

    let receipt = assert_ok!(fx.cycle().run_cycle(1).await);

    let lp = &fx.chain.executions()[1];
    assert_eq!(lp.tx_hash, receipt.liquidity_tx);
    assert_eq!(lp.funds[0], Funds::new(fx.counter(), 900));
    assert_eq!(
        lp.msg["provide_liquidity"]["assets"][0]["amount"],
        serde_json::json!("900")
    );
    assert_eq!(fx.chain.balance_of(FARMER, fx.counter()), 0);
}

#[tokio::test(start_paused = true)]
async fn test_insufficient_funds_waits_an_hour_then_retries_same_cycle() {
    let fx = Fixture::new(600);
    fx.chain.set_balance(FARMER, fx.base(), 100_000);

    // Refill halfway through the cooldown, as a faucet visit would.
    let faucet = fx.chain.clone();
    let base = fx.base().to_string();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1_800)).await;
        faucet.set_balance(FARMER, &base, 5_000_000);
    });

    let start = Instant::now();
    let summary = fx
        .controller(&RetryConfig::default())
        .run(&fx.cycle(), 1)
        .await;

    assert_eq!(summary.final_state, ControllerState::Done);
    assert_eq!(summary.failed_attempts, 1);
    assert_eq!(summary.completed(), 1);
    assert_eq!(summary.receipts[0].index, 1);
    assert_eq!(start.elapsed(), Duration::from_secs(3_600 + 5));
    assert_eq!(fx.chain.executions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_other_errors_retry_after_short_delay() {
    let fx = Fixture::new(600);
    fx.chain
        .fail_next_execute(ChainError::Transport("connection reset by peer".into()));

    let start = Instant::now();
    let summary = fx
        .controller(&RetryConfig::default())
        .run(&fx.cycle(), 1)
        .await;

    assert_eq!(summary.final_state, ControllerState::Done);
    assert_eq!(summary.failed_attempts, 1);
    assert_eq!(start.elapsed(), Duration::from_secs(10 + 5));
}

#[tokio::test(start_paused = true)]
async fn test_failed_liquidity_restarts_the_whole_cycle() {
    let fx = Fixture::new(600);
    let controller = fx.controller(&RetryConfig::default());
    let cycle = fx.cycle();

    // Swap lands at t=0, liquidity is rejected by the node at t=5.
    let chain = fx.chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        chain.fail_next_execute(ChainError::Rejected {
            codespace: "wasm".into(),
            code: 5,
            log: "Operation exceeds max spread limit".into(),
        });
    });

    let start = Instant::now();
    let summary = controller.run(&cycle, 1).await;

    assert_eq!(summary.final_state, ControllerState::Done);
    assert_eq!(summary.failed_attempts, 1);
    // step wait, error delay, step wait
    assert_eq!(start.elapsed(), Duration::from_secs(5 + 10 + 5));

    let actions: Vec<String> = fx.chain.executions().iter().map(|e| e.action()).collect();
    assert_eq!(actions, ["swap", "swap", "provide_liquidity"]);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_ceiling_gives_up() {
    let fx = Fixture::new(600);
    for _ in 0..3 {
        fx.chain
            .fail_next_execute(ChainError::Transport("node unreachable".into()));
    }
    let retry = RetryConfig {
        max_attempts: Some(2),
        ..RetryConfig::default()
    };

    let start = Instant::now();
    let summary = fx.controller(&retry).run(&fx.cycle(), 3).await;

    assert_eq!(
        summary.final_state,
        ControllerState::GaveUp {
            index: 1,
            attempts: 2
        }
    );
    assert_eq!(summary.completed(), 0);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert!(fx.chain.executions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_balance_report_failure_does_not_abort_cycle() {
    let fx = Fixture::new(600);
    fx.chain.make_denom_unavailable(fx.base());

    let receipt = assert_ok!(fx.cycle().run_cycle(1).await);
    assert_eq!(receipt.index, 1);
    assert_eq!(fx.chain.executions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_counter_balance_failure_aborts_liquidity_step() {
    let fx = Fixture::new(600);
    fx.chain.make_denom_unavailable(fx.counter());

    let err = assert_err!(fx.cycle().run_cycle(1).await);
    assert!(matches!(err, ChainError::QueryFailed { .. }));

    let actions: Vec<String> = fx.chain.executions().iter().map(|e| e.action()).collect();
    assert_eq!(actions, ["swap"]);
}

#[tokio::test(start_paused = true)]
async fn test_capped_deposit_rejected_then_retried_with_new_balance() {
    let fx = Fixture::new(2_000);

    // Rejected after the swap, while the deposit is capped at 900.
    let chain = fx.chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        chain.fail_next_execute(ChainError::Rejected {
            codespace: "wasm".into(),
            code: 5,
            log: "Operation exceeds max spread limit".into(),
        });
    });

    let summary = fx
        .controller(&RetryConfig::default())
        .run(&fx.cycle(), 1)
        .await;

    assert_eq!(summary.final_state, ControllerState::Done);
    assert_eq!(summary.failed_attempts, 1);

    // Both swaps landed, so the retried deposit is capped at 1800.
    let executions = fx.chain.executions();
    let lp = executions.last().unwrap();
    assert_eq!(lp.action(), "provide_liquidity");
    assert_eq!(lp.funds[0], Funds::new(fx.counter(), 1_800));
}
