//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` when present and deserializes into strongly-typed
//! structs; every section falls back to the built-in defaults, so the bot
//! runs without a config file. Secrets (RPC endpoint, recovery phrase) are
//! referenced by env-var name and resolved at runtime.

use anyhow::{Context, Result};
use cosmwasm_std::{Decimal, Uint128};
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub credentials: CredentialsConfig,
    pub chain: ChainConfig,
    pub protocol: ProtocolConfig,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
}

/// Names of the environment variables holding the secrets.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CredentialsConfig {
    pub rpc_endpoint_env: String,
    pub mnemonic_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint_env: "RPC_ENDPOINT".into(),
            mnemonic_env: "MNEMONIC".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChainConfig {
    /// Bech32 prefix of account addresses.
    pub address_prefix: String,
    /// Fixed gas price, `<amount><denom>`.
    pub gas_price: String,
    /// Multiplier applied to simulated gas usage.
    pub gas_adjustment: rust_decimal::Decimal,
    pub memo: String,
    pub tx_poll_interval_ms: u64,
    pub tx_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            address_prefix: "zig".into(),
            gas_price: "0.025uzig".into(),
            gas_adjustment: dec!(1.4),
            memo: "Auto Farming by Pro Bot".into(),
            tx_poll_interval_ms: 3_000,
            tx_timeout_secs: 60,
        }
    }
}

/// A native token traded by the bot.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub denom: String,
    /// Display symbol, e.g. "ZIG".
    pub symbol: String,
}

/// Router contract and the fixed amounts sent to it.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProtocolConfig {
    pub router_contract: String,
    /// Asset offered in swaps and paired in liquidity.
    pub base: TokenConfig,
    /// Asset received from swaps.
    pub counter: TokenConfig,
    /// Base-asset micro units supplied with every liquidity provision.
    pub lp_base_amount: Uint128,
    pub swap_max_spread: Decimal,
    pub lp_slippage_tolerance: Decimal,
    /// Transaction hashes are appended to this URL.
    pub explorer_tx_url: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            router_contract: "zig15jqg0hmp9n06q0as7uk3x9xkwr9k3r7yh4ww2uc0hek8zlryrgmsamk4qg"
                .into(),
            base: TokenConfig {
                denom: "uzig".into(),
                symbol: "ZIG".into(),
            },
            counter: TokenConfig {
                denom: "coin.zig10rfjm85jmzfhravjwpq3hcdz8ngxg7lxd0drkr.uoro".into(),
                symbol: "ORO".into(),
            },
            lp_base_amount: Uint128::new(150_000),
            swap_max_spread: Decimal::percent(10),
            lp_slippage_tolerance: Decimal::percent(10),
            explorer_tx_url: "https://www.zigscan.org/tx/".into(),
        }
    }
}

impl ProtocolConfig {
    pub fn explorer_link(&self, tx_hash: &str) -> String {
        format!("{}{}", self.explorer_tx_url, tx_hash)
    }
}

/// Fixed waits, in seconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingConfig {
    /// Between the swap and the liquidity provision of one cycle.
    pub step_delay_secs: u64,
    /// Between two successful cycles.
    pub cycle_delay_secs: u64,
    /// Cooldown after an ordinary cycle failure.
    pub error_delay_secs: u64,
    /// Countdown after an insufficient-funds failure.
    pub insufficient_funds_cooldown_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            step_delay_secs: 5,
            cycle_delay_secs: 5,
            error_delay_secs: 10,
            insufficient_funds_cooldown_secs: 3_600,
        }
    }
}

impl TimingConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_secs(self.step_delay_secs)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.cycle_delay_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Every retry waits the base cooldown.
    #[default]
    Fixed,
    /// The cooldown is multiplied for each consecutive failure of a cycle.
    Exponential,
}

/// Retry ceiling and backoff for failed cycles.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    /// Consecutive failures tolerated per cycle. Absent means unlimited.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
    pub backoff_multiplier: u32,
    /// Upper bound for exponential cooldowns.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed,
            backoff_multiplier: 2,
            max_delay_secs: 3_600,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load `path` if it exists, otherwise use the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolve an environment variable name to its value.
    /// Unset and blank variables both resolve to `None`.
    pub fn resolve_env(env_name: &str) -> Option<String> {
        std::env::var(env_name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}
