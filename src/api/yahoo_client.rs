use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ApiRateLimiter, MarketCapProvider, StockDataProvider};
use crate::models::{Config, PricePoint};

/// Yahoo Finance API client
///
/// Uses the public chart and quoteSummary endpoints; no authentication is
/// required. The base URL is configurable so tests can point at a local
/// mock server.
pub struct YahooClient {
    client: Client,
    base_url: String,
    rate_limiter: ApiRateLimiter,
}

impl YahooClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("fourbagger/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.quote_base_url.trim_end_matches('/').to_string(),
            rate_limiter: ApiRateLimiter::new(config.rate_limit_per_minute),
        })
    }

    /// Make a rate-limited request and parse the JSON body
    async fn make_request(&self, url: Url) -> Result<Value> {
        self.rate_limiter.wait().await;

        debug!("Making request to: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        Ok(response.json().await?)
    }

    async fn fetch_chart(&self, symbol: &str, params: &[(&str, String)]) -> Result<Vec<PricePoint>> {
        let url = Url::parse_with_params(
            &format!("{}/v8/finance/chart/{}", self.base_url, symbol),
            params,
        )?;
        let data = self.make_request(url).await?;
        Self::parse_chart(symbol, &data)
    }

    /// Extract (date, close) pairs from a chart payload
    fn parse_chart(symbol: &str, data: &Value) -> Result<Vec<PricePoint>> {
        let result = data
            .get("chart")
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .ok_or_else(|| anyhow!("Malformed chart payload for {}", symbol))?;

        let timestamps = result
            .get("timestamp")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let closes = result
            .get("indicators")
            .and_then(|v| v.get("quote"))
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|q| q.get("close"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut points = Vec::with_capacity(closes.len());
        for (ts, close) in timestamps.iter().zip(closes.iter()) {
            // Yahoo pads halted or partial sessions with nulls; drop those rows
            let (ts, close) = match (ts.as_i64(), close.as_f64()) {
                (Some(ts), Some(close)) => (ts, close),
                _ => continue,
            };
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| anyhow!("Invalid timestamp for {}: {}", symbol, ts))?
                .date_naive();
            points.push(PricePoint::new(date, close));
        }

        Ok(points)
    }
}

#[async_trait::async_trait]
impl MarketCapProvider for YahooClient {
    /// Current market capitalization, if Yahoo reports one
    async fn get_market_cap(&self, symbol: &str) -> Result<Option<f64>> {
        let url = Url::parse_with_params(
            &format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol),
            &[("modules", "price")],
        )?;

        let data = self.make_request(url).await?;
        let cap = data
            .get("quoteSummary")
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|r| r.get("price"))
            .and_then(|p| p.get("marketCap"))
            .and_then(|m| m.get("raw"))
            .and_then(|v| v.as_f64());

        debug!("{}: market cap {:?}", symbol, cap);
        Ok(cap)
    }
}

#[async_trait::async_trait]
impl StockDataProvider for YahooClient {
    /// Get daily closes for a symbol over a date range
    async fn get_price_history(
        &self,
        symbol: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let period1 = from_date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let period2 = to_date.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();

        let points = self
            .fetch_chart(
                symbol,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        debug!(
            "Retrieved {} closes for {} from {} to {}",
            points.len(),
            symbol,
            from_date,
            to_date
        );
        Ok(points)
    }

    /// Get all daily closes Yahoo has for a symbol
    async fn get_full_price_history(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let points = self
            .fetch_chart(
                symbol,
                &[("range", "max".to_string()), ("interval", "1d".to_string())],
            )
            .await?;

        debug!("Retrieved {} closes of full history for {}", points.len(), symbol);
        Ok(points)
    }
}
