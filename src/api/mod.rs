use anyhow::Result;
use chrono::NaiveDate;
use std::time::Duration;

use crate::models::PricePoint;

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Simple rate limiter for API requests
pub struct ApiRateLimiter {
    delay_ms: u64,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            60_000 / requests_per_minute as u64
        } else {
            1000 // Default 1 second delay
        };

        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// Market-capitalization lookup collaborator
///
/// The detector treats a failed lookup and an absent value the same way:
/// the symbol is excluded from the result.
#[async_trait::async_trait]
pub trait MarketCapProvider: Send + Sync {
    async fn get_market_cap(&self, symbol: &str) -> Result<Option<f64>>;
}

/// Common trait for market-data clients
#[async_trait::async_trait]
pub trait StockDataProvider: MarketCapProvider {
    async fn get_price_history(
        &self,
        symbol: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<PricePoint>>;

    /// Maximum available daily history, used as the one-shot retry path
    /// when a ranged fetch fails.
    async fn get_full_price_history(&self, symbol: &str) -> Result<Vec<PricePoint>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter() {
        let limiter = ApiRateLimiter::new(600); // 600 requests per minute

        let start = std::time::Instant::now();

        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));

        // Each wait accumulates another full delay
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
