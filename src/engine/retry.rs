//! Retry controller.
//!
//! Drives cycles `1..=total` as a state machine. A failed cycle is retried
//! at the same index after a cooldown chosen by its error class:
//! a long countdown for insufficient funds, a short wait otherwise.
//! By default there is no attempt ceiling and every wait is fixed.

use std::time::Duration;
use tracing::{error, info, warn};

use super::cycle::CycleRunner;
use crate::chain::{ChainError, CODE_INSUFFICIENT_FUNDS, SDK_CODESPACE};
use crate::config::{Backoff, RetryConfig, TimingConfig};
use crate::console;
use crate::types::{CycleOutcome, CycleReceipt, ErrorClass};

/// Substring fallback for errors without a structured code.
const INSUFFICIENT_FUNDS_PATTERN: &str = "insufficient funds";

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Map a cycle error to the cooldown class.
///
/// `sdk` code 5 is the bank/ante `ErrInsufficientFunds`. Anything else,
/// including contract errors, is matched on its message text.
pub fn classify(err: &ChainError) -> ErrorClass {
    if let Some((SDK_CODESPACE, CODE_INSUFFICIENT_FUNDS)) = err.abci_code() {
        return ErrorClass::InsufficientFunds;
    }
    if err.to_string().contains(INSUFFICIENT_FUNDS_PATTERN) {
        ErrorClass::InsufficientFunds
    } else {
        ErrorClass::Other
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub insufficient_funds_cooldown: Duration,
    pub error_delay: Duration,
    pub cycle_delay: Duration,
    /// Consecutive failures allowed per cycle; `None` retries forever.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
    pub backoff_multiplier: u32,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(timing: &TimingConfig, retry: &RetryConfig) -> Self {
        Self {
            insufficient_funds_cooldown: Duration::from_secs(
                timing.insufficient_funds_cooldown_secs,
            ),
            error_delay: Duration::from_secs(timing.error_delay_secs),
            cycle_delay: timing.cycle_delay(),
            max_attempts: retry.max_attempts,
            backoff: retry.backoff,
            backoff_multiplier: retry.backoff_multiplier,
            max_delay: Duration::from_secs(retry.max_delay_secs),
        }
    }

    /// Wait before retry number `attempt` (1-based) after a `class` failure.
    pub fn cooldown(&self, class: ErrorClass, attempt: u32) -> Duration {
        let base = match class {
            ErrorClass::InsufficientFunds => self.insufficient_funds_cooldown,
            ErrorClass::Other => self.error_delay,
        };

        match self.backoff {
            Backoff::Fixed => base,
            Backoff::Exponential => {
                let factor = self
                    .backoff_multiplier
                    .saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(self.max_delay.max(base))
            }
        }
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default(), &RetryConfig::default())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Running(u32),
    CooldownLong { index: u32, wait: Duration },
    CooldownShort { index: u32, wait: Duration },
    Done,
    /// A configured attempt ceiling was reached.
    GaveUp { index: u32, attempts: u32 },
}

impl ControllerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::Done | ControllerState::GaveUp { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_cycles: u32,
    pub receipts: Vec<CycleReceipt>,
    pub failed_attempts: u32,
    /// Message of the most recent failed attempt.
    pub last_error: Option<String>,
    pub final_state: ControllerState,
}

impl RunSummary {
    pub fn completed(&self) -> u32 {
        self.receipts.len() as u32
    }
}

pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Next state after cycle `index` ended with `outcome`.
    ///
    /// `attempts` counts consecutive failures of `index`, including this one.
    pub fn transition(
        &self,
        index: u32,
        total_cycles: u32,
        outcome: &CycleOutcome,
        attempts: u32,
    ) -> ControllerState {
        match outcome {
            CycleOutcome::Success(_) if index >= total_cycles => ControllerState::Done,
            CycleOutcome::Success(_) => ControllerState::Running(index + 1),
            CycleOutcome::Failure { .. } if self.policy.exhausted(attempts) => {
                ControllerState::GaveUp { index, attempts }
            }
            CycleOutcome::Failure { class, .. } => {
                let wait = self.policy.cooldown(*class, attempts);
                match class {
                    ErrorClass::InsufficientFunds => ControllerState::CooldownLong { index, wait },
                    ErrorClass::Other => ControllerState::CooldownShort { index, wait },
                }
            }
        }
    }

    /// Run cycles `1..=total_cycles` until done or out of attempts.
    pub async fn run<R>(&self, runner: &R, total_cycles: u32) -> RunSummary
    where
        R: CycleRunner + ?Sized,
    {
        let mut summary = RunSummary {
            total_cycles,
            receipts: Vec::new(),
            failed_attempts: 0,
            last_error: None,
            final_state: ControllerState::Done,
        };
        if total_cycles == 0 {
            return summary;
        }

        let mut state = ControllerState::Running(1);
        let mut attempts = 0u32;

        while !state.is_terminal() {
            state = match state {
                ControllerState::Running(index) => {
                    let outcome = match runner.run_cycle(index).await {
                        Ok(receipt) => {
                            attempts = 0;
                            summary.receipts.push(receipt.clone());
                            CycleOutcome::Success(receipt)
                        }
                        Err(err) => {
                            attempts += 1;
                            summary.failed_attempts += 1;
                            self.report_failure(index, attempts, &err)
                        }
                    };

                    if let CycleOutcome::Failure { message, .. } = &outcome {
                        summary.last_error = Some(message.clone());
                    }

                    let next = self.transition(index, total_cycles, &outcome, attempts);
                    if let ControllerState::Running(next_index) = next {
                        let delay = self.policy.cycle_delay;
                        console::info(&format!(
                            "Waiting for {} seconds before the next cycle...",
                            delay.as_secs()
                        ));
                        tokio::time::sleep(delay).await;
                        console::success(&format!(
                            "Wait complete. Starting cycle #{next_index}."
                        ));
                    }
                    next
                }
                ControllerState::CooldownLong { index, wait } => {
                    console::notice("> Insufficient funds detected. Use the faucet if needed.");
                    console::countdown(wait).await;
                    ControllerState::Running(index)
                }
                ControllerState::CooldownShort { index, wait } => {
                    console::notice(&format!(
                        "> Unexpected error. Retrying in {} seconds...",
                        wait.as_secs()
                    ));
                    tokio::time::sleep(wait).await;
                    ControllerState::Running(index)
                }
                terminal => terminal,
            };
        }

        match &state {
            ControllerState::Done => {
                console::success(&format!(
                    "\nAll {total_cycles} cycles completed successfully!"
                ));
                info!(
                    cycles = total_cycles,
                    failed_attempts = summary.failed_attempts,
                    "Run complete"
                );
            }
            ControllerState::GaveUp { index, attempts } => {
                console::failure(&format!(
                    "Giving up on cycle #{index} after {attempts} failed attempts."
                ));
                error!(cycle = index, attempts, "Retry ceiling reached");
            }
            _ => {}
        }

        summary.final_state = state;
        summary
    }

    fn report_failure(&self, index: u32, attempts: u32, err: &ChainError) -> CycleOutcome {
        let class = classify(err);
        let message = err.to_string();

        console::failure(&format!("\nERROR occurred during cycle #{index}:"));
        console::failure(&format!("> Message: {message}"));
        warn!(cycle = index, attempt = attempts, class = %class, error = %message, "Cycle failed");

        CycleOutcome::Failure { class, message }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
