//! Candidate symbol lists
//!
//! Sourcing a universe from exchange directories is out of scope; the
//! screener takes a caller-provided file and applies the standard-ticker
//! rule to it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Load candidate symbols from a file
///
/// Accepts a plain list (one symbol per line) or a CSV whose first column
/// holds the symbol. Symbols are uppercased and de-duplicated preserving
/// first appearance; a leading header row is ignored.
pub fn load_symbols(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open symbols file {}", path.display()))?;

    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for record in reader.records() {
        let record = record?;
        let field = match record.get(0) {
            Some(field) => field,
            None => continue,
        };
        let symbol = field.trim().to_ascii_uppercase();
        if symbol.is_empty() || symbol == "SYMBOL" || symbol == "ACT SYMBOL" {
            continue;
        }
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    info!("Loaded {} symbols from {}", symbols.len(), path.display());
    Ok(symbols)
}

/// Standard-ticker rule: one to four ASCII letters
///
/// Longer or punctuated listings (units, warrants, preferred shares, test
/// issues) are not screened.
pub fn is_standard_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.len() <= 4 && symbol.chars().all(|c| c.is_ascii_alphabetic())
}

/// Keep only standard symbols
pub fn filter_standard(symbols: Vec<String>) -> Vec<String> {
    let before = symbols.len();
    let filtered: Vec<String> = symbols
        .into_iter()
        .filter(|s| is_standard_symbol(s))
        .collect();

    if filtered.len() < before {
        info!("Filtered out {} non-standard symbols", before - filtered.len());
    }
    filtered
}
