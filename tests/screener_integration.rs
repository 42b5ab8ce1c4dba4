//! End-to-end screening tests over a mocked market-data provider

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use mockall::mock;
use pretty_assertions::assert_eq;

use fourbagger::analysis::LOOKBACK_SAMPLES;
use fourbagger::api::{MarketCapProvider, StockDataProvider};
use fourbagger::models::{Config, PricePoint};
use fourbagger::screener::Screener;

mock! {
    pub Provider {}

    #[async_trait]
    impl MarketCapProvider for Provider {
        async fn get_market_cap(&self, symbol: &str) -> Result<Option<f64>>;
    }

    #[async_trait]
    impl StockDataProvider for Provider {
        async fn get_price_history(
            &self,
            symbol: &str,
            from_date: NaiveDate,
            to_date: NaiveDate,
        ) -> Result<Vec<PricePoint>>;

        async fn get_full_price_history(&self, symbol: &str) -> Result<Vec<PricePoint>>;
    }
}

fn test_config() -> Config {
    Config {
        quote_base_url: "http://localhost:0".to_string(),
        rate_limit_per_minute: 60_000,
        max_concurrent_fetches: 4,
        fetch_lookback_days: 1095,
    }
}

/// 365 flat closes at 1.0 followed by one close at `spike`
fn flat_then_spike(spike: f64) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut series: Vec<PricePoint> = (0..LOOKBACK_SAMPLES)
        .map(|i| PricePoint::new(start + Duration::days(i as i64), 1.0))
        .collect();
    series.push(PricePoint::new(
        start + Duration::days(LOOKBACK_SAMPLES as i64),
        spike,
    ));
    series
}

#[test_log::test(tokio::test)]
async fn screen_matches_quadrupled_symbols_above_cap_floor() {
    let mut provider = MockProvider::new();
    provider
        .expect_get_price_history()
        .times(3)
        .returning(|symbol, _, _| {
            Ok(match symbol {
                "AAA" | "BBB" => flat_then_spike(4.0),
                "CCC" => flat_then_spike(3.99),
                other => panic!("unexpected symbol {}", other),
            })
        });
    // CCC never quadruples, so its market cap is never requested
    provider
        .expect_get_market_cap()
        .withf(|symbol| symbol == "AAA")
        .times(1)
        .returning(|_| Ok(Some(150.0)));
    provider
        .expect_get_market_cap()
        .withf(|symbol| symbol == "BBB")
        .times(1)
        .returning(|_| Ok(Some(50.0)));

    let screener = Screener::new(Arc::new(provider), test_config());
    let symbols = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
    let report = screener.run(&symbols, 100.0).await.unwrap();

    assert_eq!(report.matches, vec!["AAA".to_string()]);
    assert_eq!(report.requested, 3);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.empty, 0);
}

#[test_log::test(tokio::test)]
async fn failed_symbol_is_retried_once_then_dropped() {
    let mut provider = MockProvider::new();
    provider
        .expect_get_price_history()
        .withf(|symbol, _, _| symbol == "BAD")
        .times(1)
        .returning(|_, _, _| Err(anyhow!("socket timeout")));
    provider
        .expect_get_full_price_history()
        .withf(|symbol| symbol == "BAD")
        .times(1)
        .returning(|_| Err(anyhow!("socket timeout")));
    provider
        .expect_get_price_history()
        .withf(|symbol, _, _| symbol == "GOOD")
        .times(1)
        .returning(|_, _, _| Ok(flat_then_spike(4.5)));
    provider
        .expect_get_market_cap()
        .withf(|symbol| symbol == "GOOD")
        .times(1)
        .returning(|_| Ok(Some(2e9)));

    let screener = Screener::new(Arc::new(provider), test_config());
    let symbols = vec!["BAD".to_string(), "GOOD".to_string()];
    let report = screener.run(&symbols, 1e8).await.unwrap();

    assert_eq!(report.matches, vec!["GOOD".to_string()]);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, 1);
}

#[test_log::test(tokio::test)]
async fn full_history_retry_can_recover_a_symbol() {
    let mut provider = MockProvider::new();
    provider
        .expect_get_price_history()
        .times(1)
        .returning(|_, _, _| Err(anyhow!("invalid date range")));
    provider
        .expect_get_full_price_history()
        .withf(|symbol| symbol == "LAZR")
        .times(1)
        .returning(|_| Ok(flat_then_spike(4.0)));
    provider
        .expect_get_market_cap()
        .times(1)
        .returning(|_| Ok(Some(5e8)));

    let screener = Screener::new(Arc::new(provider), test_config());
    let report = screener.run(&["LAZR".to_string()], 1e8).await.unwrap();

    assert_eq!(report.matches, vec!["LAZR".to_string()]);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, 0);
}

#[test_log::test(tokio::test)]
async fn empty_series_counts_but_never_matches() {
    let mut provider = MockProvider::new();
    provider
        .expect_get_price_history()
        .times(1)
        .returning(|_, _, _| Ok(Vec::new()));
    // No market-cap expectation: an empty series must never reach the lookup

    let screener = Screener::new(Arc::new(provider), test_config());
    let report = screener.run(&["NIL".to_string()], 1e8).await.unwrap();

    assert!(report.matches.is_empty());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.empty, 1);
    assert_eq!(report.failed, 0);
}
