//! Concurrent screening pipeline
//!
//! Fetches trailing daily closes for every candidate symbol, isolating
//! per-symbol failures, then hands the assembled series map to the detector
//! and applies the market-cap floor.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis;
use crate::api::StockDataProvider;
use crate::models::{Config, PricePoint};

/// Result of a full screening run
#[derive(Debug, Serialize)]
pub struct ScreenReport {
    /// Symbols that quadrupled and cleared the market-cap floor, sorted
    pub matches: Vec<String>,
    pub requested: usize,
    pub fetched: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Screening orchestrator over an injected market-data provider
pub struct Screener<P> {
    provider: Arc<P>,
    config: Config,
}

impl<P: StockDataProvider + 'static> Screener<P> {
    pub fn new(provider: Arc<P>, config: Config) -> Self {
        Self { provider, config }
    }

    /// Run the full screen over the given symbols
    pub async fn run(&self, symbols: &[String], min_market_cap: f64) -> Result<ScreenReport> {
        info!(
            "Screening {} symbols with market-cap floor {:.0}",
            symbols.len(),
            min_market_cap
        );

        let (histories, failed) = self.fetch_histories(symbols).await;
        let fetched = histories.len();
        let empty = histories.values().filter(|s| s.is_empty()).count();

        let matched = analysis::detect(&histories, min_market_cap, self.provider.as_ref()).await?;
        let mut matches: Vec<String> = matched.into_iter().collect();
        matches.sort();

        info!(
            "Screen complete: {} matched, {} fetched, {} failed",
            matches.len(),
            fetched,
            failed
        );

        Ok(ScreenReport {
            matches,
            requested: symbols.len(),
            fetched,
            empty,
            failed,
        })
    }

    /// Fetch trailing daily closes for every symbol
    ///
    /// Failures are isolated per symbol: a symbol that still fails after the
    /// retry is dropped with a warning and counted, never aborting the rest.
    pub async fn fetch_histories(
        &self,
        symbols: &[String],
    ) -> (HashMap<String, Vec<PricePoint>>, usize) {
        let to_date = Utc::now().date_naive();
        let from_date = to_date - Duration::days(self.config.fetch_lookback_days);
        info!(
            "Fetching daily closes for {} symbols, {} to {}",
            symbols.len(),
            from_date,
            to_date
        );

        let total = symbols.len();
        let mut histories = HashMap::new();
        let mut failed = 0;
        let mut processed = 0;

        let mut results = stream::iter(symbols.iter().cloned())
            .map(|symbol| {
                let provider = Arc::clone(&self.provider);
                async move {
                    let result =
                        Self::fetch_one(provider.as_ref(), &symbol, from_date, to_date).await;
                    (symbol, result)
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches);

        while let Some((symbol, result)) = results.next().await {
            processed += 1;
            match result {
                Ok(series) => {
                    debug!("{}: {} closes", symbol, series.len());
                    histories.insert(symbol, series);
                }
                Err(e) => {
                    failed += 1;
                    warn!("{}: dropped after failed fetch - {}", symbol, e);
                }
            }

            if processed % 25 == 0 {
                info!(
                    "Progress: {}/{} symbols fetched, {} failures",
                    processed, total, failed
                );
            }
        }

        (histories, failed)
    }

    /// Ranged fetch with a single full-history retry on failure
    async fn fetch_one(
        provider: &P,
        symbol: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        match provider.get_price_history(symbol, from_date, to_date).await {
            Ok(series) => Ok(series),
            Err(e) => {
                warn!(
                    "{}: ranged fetch failed, retrying with full history - {}",
                    symbol, e
                );
                provider.get_full_price_history(symbol).await
            }
        }
    }
}
