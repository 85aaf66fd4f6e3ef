//! Oroswap farming bot entry point.
//!
//! Loads `.env` and `config.toml`, initialises structured logging, asks
//! for the swap amount and cycle count, connects the wallet and runs the
//! swap→liquidity cycles until all of them have completed.

use anyhow::Result;
use tracing::{error, info};

use oroswap_farmer::config::AppConfig;
use oroswap_farmer::console;
use oroswap_farmer::engine::cycle::FarmingCycle;
use oroswap_farmer::engine::retry::{ControllerState, RetryController, RetryPolicy};
use oroswap_farmer::input;
use oroswap_farmer::session::{self, Credentials};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = AppConfig::load_or_default(CONFIG_PATH)?;

    console::banner();
    info!(
        router = %cfg.protocol.router_contract,
        gas_price = %cfg.chain.gas_price,
        max_attempts = ?cfg.retry.max_attempts,
        "Farming bot starting up"
    );

    // -- Credentials ------------------------------------------------------

    let credentials = match Credentials::from_env(&cfg.credentials) {
        Ok(credentials) => credentials,
        Err(e) => {
            console::failure(&format!("FATAL: {e}. Bot is stopping."));
            error!(error = %e, "Missing credentials");
            return Ok(());
        }
    };

    // -- Run parameters ---------------------------------------------------

    let params = match input::collect_from_terminal(&cfg.protocol.base.symbol).await {
        Ok(params) => params,
        Err(e) => {
            console::failure(&format!("FATAL: {e}"));
            error!(error = %e, "Failed to read run parameters");
            return Ok(());
        }
    };

    console::notice(&format!(
        "> Retry delay set to {} for insufficient funds.",
        console::hms(cfg.timing.insufficient_funds_cooldown_secs)
    ));

    // -- Session ----------------------------------------------------------

    console::info("Initializing client...");
    let session = match session::initialize(&credentials, &cfg.chain).await {
        Ok(session) => {
            console::success("Client initialized successfully.");
            session
        }
        Err(e) => {
            console::failure(
                "FATAL: Failed to initialize the client. Check RPC endpoint and mnemonic.",
            );
            console::failure(&format!("> Details: {e}"));
            error!(error = %e, "Session initialization failed");
            return Ok(());
        }
    };
    console::success(&format!("> Connected to wallet: {}", session.address()));

    // -- Cycles -----------------------------------------------------------

    let cycle = FarmingCycle::new(
        &session,
        &cfg.protocol,
        &cfg.timing,
        params.swap_amount_micro(),
    );
    let controller = RetryController::new(RetryPolicy::from_config(&cfg.timing, &cfg.retry));

    info!(
        swap_amount = params.swap_amount_micro(),
        cycles = params.total_cycles(),
        "Entering farming loop"
    );
    let summary = controller.run(&cycle, params.total_cycles()).await;

    info!(
        cycles = summary.total_cycles,
        completed = summary.completed(),
        failed_attempts = summary.failed_attempts,
        final_state = ?summary.final_state,
        "Farming bot finished"
    );

    if let ControllerState::GaveUp { index, attempts } = summary.final_state {
        let last_error = summary.last_error.as_deref().unwrap_or("unknown error");
        anyhow::bail!(
            "cycle #{index} failed {attempts} times in a row, retry ceiling reached: {last_error}"
        );
    }

    Ok(())
}

/// Initialise the `tracing` subscriber on stderr.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oroswap_farmer=info"));

    let json_logging = std::env::var("FARMER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
