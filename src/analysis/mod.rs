//! Quadrupling detection over daily closing-price series
//!
//! The rule: a ticker flags when some close reaches at least four times the
//! trailing 365-sample maximum as it stood 365 samples earlier. Flagged
//! tickers are then filtered by a market-capitalization floor resolved
//! through [`MarketCapProvider`].

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::MarketCapProvider;
use crate::models::PricePoint;

/// Width of the rolling-maximum window, in samples. The same count is used
/// as the shift between a close and its reference maximum.
pub const LOOKBACK_SAMPLES: usize = 365;

/// Multiple of the year-ago rolling maximum a close must reach to flag.
pub const QUADRUPLE_FACTOR: f64 = 4.0;

/// Validation failures for per-ticker price series
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("price series for {symbol} is not in ascending date order at {date}")]
    OutOfOrder { symbol: String, date: NaiveDate },

    #[error("price series for {symbol} has a non-finite close on {date}")]
    BadClose { symbol: String, date: NaiveDate },
}

/// Trailing-window maximum including the current sample
///
/// Windows shorter than `window` are allowed at the start of the slice, so
/// `result[i]` is the maximum of the most recent `min(i + 1, window)` values.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let mut maxes = Vec::with_capacity(values.len());
    // Indices of candidate maxima; their values decrease front to back
    let mut candidates: VecDeque<usize> = VecDeque::new();

    for (i, &value) in values.iter().enumerate() {
        while let Some(&front) = candidates.front() {
            if i - front >= window {
                candidates.pop_front();
            } else {
                break;
            }
        }
        while let Some(&back) = candidates.back() {
            if values[back] <= value {
                candidates.pop_back();
            } else {
                break;
            }
        }
        candidates.push_back(i);
        maxes.push(values[candidates[0]]);
    }

    maxes
}

/// Whether any close reached [`QUADRUPLE_FACTOR`] times the rolling maximum
/// recorded [`LOOKBACK_SAMPLES`] samples earlier
///
/// A series of `LOOKBACK_SAMPLES` entries or fewer has no shifted reference
/// at any index and can never flag, even though the rolling maximum itself
/// accepts partial windows.
pub fn has_quadrupled(closes: &[f64]) -> bool {
    if closes.len() <= LOOKBACK_SAMPLES {
        return false;
    }

    let maxes = rolling_max(closes, LOOKBACK_SAMPLES);
    closes
        .iter()
        .enumerate()
        .skip(LOOKBACK_SAMPLES)
        .any(|(i, &close)| close >= QUADRUPLE_FACTOR * maxes[i - LOOKBACK_SAMPLES])
}

/// Check that a series is strictly ascending by date with finite closes
pub fn validate_series(symbol: &str, series: &[PricePoint]) -> Result<(), ScreenError> {
    for pair in series.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(ScreenError::OutOfOrder {
                symbol: symbol.to_string(),
                date: pair[1].date,
            });
        }
    }
    if let Some(point) = series.iter().find(|p| !p.close.is_finite()) {
        return Err(ScreenError::BadClose {
            symbol: symbol.to_string(),
            date: point.date,
        });
    }
    Ok(())
}

/// Flag the symbols whose series quadrupled within the trailing year
///
/// Every series is validated up front; a malformed one fails the whole call,
/// naming the offending ticker. Empty series contribute nothing.
pub fn flag_quadrupled(
    series_map: &HashMap<String, Vec<PricePoint>>,
) -> Result<Vec<String>, ScreenError> {
    let mut flagged = Vec::new();

    for (symbol, series) in series_map {
        validate_series(symbol, series)?;

        if series.is_empty() {
            debug!("{}: empty series, skipping", symbol);
            continue;
        }

        let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
        if has_quadrupled(&closes) {
            debug!("{}: quadrupled within the trailing year", symbol);
            flagged.push(symbol.clone());
        }
    }

    Ok(flagged)
}

/// Detect quadrupled tickers that also clear the market-cap floor
///
/// The floor is inclusive. A lookup that fails or resolves to no value
/// excludes the symbol without affecting the rest of the run.
pub async fn detect<P>(
    series_map: &HashMap<String, Vec<PricePoint>>,
    min_market_cap: f64,
    provider: &P,
) -> Result<HashSet<String>, ScreenError>
where
    P: MarketCapProvider + ?Sized,
{
    let mut matches = HashSet::new();

    for symbol in flag_quadrupled(series_map)? {
        match provider.get_market_cap(&symbol).await {
            Ok(Some(cap)) if cap >= min_market_cap => {
                matches.insert(symbol);
            }
            Ok(Some(cap)) => {
                debug!(
                    "{}: market cap {:.0} below floor {:.0}, excluding",
                    symbol, cap, min_market_cap
                );
            }
            Ok(None) => {
                debug!("{}: market cap unavailable, excluding", symbol);
            }
            Err(e) => {
                warn!("{}: market cap lookup failed, excluding - {}", symbol, e);
            }
        }
    }

    Ok(matches)
}
