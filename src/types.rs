//! Shared types for the farming bot.
//!
//! The run parameters gathered at startup, the per-cycle results, and the
//! micro-unit conversions used for display.

use rust_decimal::prelude::*;
use std::fmt;
use std::num::{NonZeroU128, NonZeroU32};

/// Micro units per major token unit.
pub const MICRO_PER_UNIT: u32 = 1_000_000;

/// Decimal places of a micro-denominated token.
const MICRO_SCALE: u32 = 6;

// ---------------------------------------------------------------------------
// Run parameters
// ---------------------------------------------------------------------------

/// Validated user input for one run. Both fields are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    swap_amount_micro: NonZeroU128,
    total_cycles: NonZeroU32,
}

impl RunParameters {
    pub fn new(swap_amount_micro: NonZeroU128, total_cycles: NonZeroU32) -> Self {
        Self {
            swap_amount_micro,
            total_cycles,
        }
    }

    pub fn swap_amount_micro(&self) -> u128 {
        self.swap_amount_micro.get()
    }

    pub fn total_cycles(&self) -> u32 {
        self.total_cycles.get()
    }
}

// ---------------------------------------------------------------------------
// Cycle results
// ---------------------------------------------------------------------------

/// Hashes of the two transactions of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReceipt {
    pub index: u32,
    pub swap_tx: String,
    pub liquidity_tx: String,
}

/// Coarse error class that selects the retry cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InsufficientFunds,
    Other,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::InsufficientFunds => write!(f, "insufficient funds"),
            ErrorClass::Other => write!(f, "other"),
        }
    }
}

/// Result of one cycle attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Success(CycleReceipt),
    Failure { class: ErrorClass, message: String },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Success(_))
    }
}

// ---------------------------------------------------------------------------
// Amount helpers
// ---------------------------------------------------------------------------

/// Convert a micro-unit amount to major units.
/// Amounts beyond the range of `Decimal` saturate at `Decimal::MAX`.
pub fn micro_to_major(amount: u128) -> Decimal {
    i128::try_from(amount)
        .ok()
        .and_then(|n| Decimal::try_from_i128_with_scale(n, MICRO_SCALE).ok())
        .unwrap_or(Decimal::MAX)
}

/// `amount` in major units with four decimal places and a symbol suffix.
pub fn format_micro(amount: u128, symbol: &str) -> String {
    let major = micro_to_major(amount)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    format!("{major:.4} {symbol}")
}
