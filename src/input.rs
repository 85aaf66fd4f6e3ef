//! Interactive input collection.
//!
//! Prompts until the swap amount and the cycle count both parse as
//! positive values and returns them as `RunParameters`. Reader and writer
//! are generic so the prompt loop runs against in-memory buffers in tests.

use colored::Colorize;
use rust_decimal::prelude::*;
use std::num::{IntErrorKind, NonZeroU128, NonZeroU32};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::types::{RunParameters, MICRO_PER_UNIT};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input closed before a valid {0} was entered")]
    Closed(&'static str),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an entered value was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not a number, or not greater than zero.
    Invalid,
    /// A positive number beyond the representable range.
    TooLarge,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Digits with at most one decimal point.
fn is_plain_number(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || c == '.')
        && s.matches('.').count() <= 1
}

/// Parse a swap amount in major units.
///
/// Returns the amount as entered and its micro-unit value (truncated).
/// Anything that is not a number greater than zero is `Invalid`, including
/// amounts smaller than one micro unit. Amounts above `Decimal::MAX` are
/// `TooLarge`.
pub fn parse_swap_amount(input: &str) -> Result<(Decimal, NonZeroU128), Rejection> {
    let trimmed = input.trim();
    let major = match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
        Ok(major) => major,
        Err(_) if is_plain_number(trimmed) => return Err(Rejection::TooLarge),
        Err(_) => return Err(Rejection::Invalid),
    };

    if major <= Decimal::ZERO {
        return Err(Rejection::Invalid);
    }

    // Whole and fractional parts are scaled separately so large amounts
    // do not overflow `Decimal`.
    let whole = major.trunc().to_u128().ok_or(Rejection::TooLarge)?;
    let fraction = (major.fract() * Decimal::from(MICRO_PER_UNIT))
        .trunc()
        .to_u128()
        .ok_or(Rejection::Invalid)?;
    let micro = whole
        .checked_mul(u128::from(MICRO_PER_UNIT))
        .and_then(|w| w.checked_add(fraction))
        .ok_or(Rejection::TooLarge)?;

    NonZeroU128::new(micro)
        .map(|micro| (major.normalize(), micro))
        .ok_or(Rejection::Invalid)
}

/// Parse a positive cycle count.
pub fn parse_cycle_count(input: &str) -> Result<NonZeroU32, Rejection> {
    match input.trim().parse::<NonZeroU32>() {
        Ok(cycles) => Ok(cycles),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Err(Rejection::TooLarge),
        Err(_) => Err(Rejection::Invalid),
    }
}

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Ask both questions and build the run parameters.
    pub async fn collect(&mut self, symbol: &str) -> Result<RunParameters, InputError> {
        let swap_amount_micro = self.swap_amount(symbol).await?;
        let total_cycles = self.cycle_count().await?;
        Ok(RunParameters::new(swap_amount_micro, total_cycles))
    }

    pub async fn swap_amount(&mut self, symbol: &str) -> Result<NonZeroU128, InputError> {
        let question = format!("Enter the amount to swap in {symbol} (e.g., 0.25): ");
        loop {
            let line = self.ask(&question).await?.ok_or(InputError::Closed("swap amount"))?;
            let msg = match parse_swap_amount(&line) {
                Ok((major, micro)) => {
                    let msg = format!("> Swap amount set to {major} {symbol}.");
                    self.say(&msg.green().to_string()).await?;
                    return Ok(micro);
                }
                Err(Rejection::Invalid) => {
                    "> Invalid input. Please enter a positive number (e.g., 0.25).".to_string()
                }
                Err(Rejection::TooLarge) => format!(
                    "> Invalid input. The amount cannot exceed {} {symbol}.",
                    Decimal::MAX
                ),
            };
            self.say(&msg.red().to_string()).await?;
        }
    }

    pub async fn cycle_count(&mut self) -> Result<NonZeroU32, InputError> {
        let question = "Enter the number of swap cycles to perform (e.g., 10): ";
        loop {
            let line = self.ask(question).await?.ok_or(InputError::Closed("cycle count"))?;
            let msg = match parse_cycle_count(&line) {
                Ok(cycles) => {
                    let msg = format!("> Number of cycles set to {cycles}.");
                    self.say(&msg.green().to_string()).await?;
                    return Ok(cycles);
                }
                Err(Rejection::Invalid) => {
                    "> Invalid input. Please enter a positive integer (e.g., 10).".to_string()
                }
                Err(Rejection::TooLarge) => format!(
                    "> Invalid input. The number of cycles cannot exceed {}.",
                    u32::MAX
                ),
            };
            self.say(&msg.red().to_string()).await?;
        }
    }

    /// Print `question` and read one line. `None` at end of input.
    async fn ask(&mut self, question: &str) -> Result<Option<String>, InputError> {
        self.writer
            .write_all(question.cyan().to_string().as_bytes())
            .await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn say(&mut self, line: &str) -> Result<(), InputError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Collect run parameters on the process terminal.
pub async fn collect_from_terminal(symbol: &str) -> Result<RunParameters, InputError> {
    let mut prompter = Prompter::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    prompter.collect(symbol).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
