use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Shortest fetch window (calendar days) that can ever produce a flag: a
/// close only counts with 365 samples of history before it, and a trading
/// year yields roughly 252 samples.
pub const MIN_FETCH_LOOKBACK_DAYS: i64 = 540;

/// A single daily closing-price observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub quote_base_url: String,
    pub rate_limit_per_minute: u32,
    pub max_concurrent_fetches: usize,
    pub fetch_lookback_days: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Config {
            quote_base_url: std::env::var("QUOTE_BASE_URL")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string()),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            max_concurrent_fetches: std::env::var("MAX_CONCURRENT_FETCHES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            fetch_lookback_days: std::env::var("FETCH_LOOKBACK_DAYS")
                .unwrap_or_else(|_| "1095".to_string())
                .parse()
                .unwrap_or(1095),
        };

        if config.fetch_lookback_days < MIN_FETCH_LOOKBACK_DAYS {
            return Err(anyhow::anyhow!(
                "FETCH_LOOKBACK_DAYS must be at least {} (got {})",
                MIN_FETCH_LOOKBACK_DAYS,
                config.fetch_lookback_days
            ));
        }

        Ok(config)
    }
}
