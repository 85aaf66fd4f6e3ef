//! Operator-facing console output.
//!
//! Progress lines go to stdout with colour; structured logs go through
//! `tracing` to stderr.

use colored::Colorize;
use std::io::Write;
use std::time::Duration;

pub const BANNER: &str = r#"
  ___  ____   ___  ______      ___    ____
 / _ \|  _ \ / _ \/ ___\ \    / / \  |  _ \
| | | | |_) | | | \___ \\ \/\/ / _ \ | |_) |
| |_| |  _ <| |_| |___) |\    / ___ \|  __/
 \___/|_| \_\\___/|____/  \/\/_/   \_\_|

  Oroswap Farming Bot: swap + liquidity cycles on ZigChain
"#;

pub fn banner() {
    println!("{}", BANNER.bright_magenta());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn notice(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn failure(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn cycle_header(index: u32, timestamp: &str) {
    let rule = "-----------------------------------------------------";
    println!("\n{}", rule.blue());
    println!(
        "{}",
        format!("Starting Farming Cycle #{index} | {timestamp}").blue()
    );
    println!("{}", rule.blue());
}

/// `HH:MM:SS` for a number of seconds.
pub fn hms(total_secs: u64) -> String {
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Wait `duration`, redrawing the remaining time once per second.
pub async fn countdown(duration: Duration) {
    let total = duration.as_secs();
    let mut stdout = std::io::stdout();

    for remaining in (1..=total).rev() {
        let line = format!("Retrying in {}", hms(remaining));
        // Redraw failure only affects the display.
        let _ = write!(stdout, "\r{}", line.yellow());
        let _ = stdout.flush();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    println!();
    success("Countdown finished. Resuming operations...");
}
