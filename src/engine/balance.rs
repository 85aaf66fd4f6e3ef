//! Best-effort balance display.

use tracing::debug;

use crate::chain::ChainClient;
use crate::types::format_micro;

/// Balance of `address` in `denom` as `"{amount:.4} {symbol}"`.
///
/// Query failures are logged and shown as a zero balance; this never
/// returns an error.
pub async fn formatted_balance<C>(client: &C, address: &str, denom: &str, symbol: &str) -> String
where
    C: ChainClient + ?Sized,
{
    match client.balance(address, denom).await {
        Ok(amount) => format_micro(amount, symbol),
        Err(e) => {
            debug!(denom, error = %e, "Balance query failed, showing zero");
            format_micro(0, symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, MockChainClient};

    #[tokio::test]
    async fn test_formats_balance() {
        let mut client = MockChainClient::new();
        client.expect_balance().returning(|_, _| Ok(1_500_000));
        let s = formatted_balance(&client, "zig1me", "uzig", "ZIG").await;
        assert_eq!(s, "1.5000 ZIG");
    }

    #[tokio::test]
    async fn test_query_failure_shows_zero() {
        let mut client = MockChainClient::new();
        client
            .expect_balance()
            .returning(|_, _| Err(ChainError::Transport("connection reset".into())));
        let s = formatted_balance(&client, "zig1me", "uoro", "ORO").await;
        assert_eq!(s, "0.0000 ORO");
    }
}
