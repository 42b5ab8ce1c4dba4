use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter, FmtSubscriber};

use fourbagger::api::YahooClient;
use fourbagger::models::Config;
use fourbagger::screener::Screener;
use fourbagger::universe;

/// Quadrupled-stock screener
#[derive(Parser)]
#[command(name = "fourbagger")]
#[command(about = "Find stocks that quadrupled in the past year and clear a market-cap floor")]
struct Args {
    /// File of candidate ticker symbols (CSV or one symbol per line)
    #[arg(long, short = 's')]
    symbols_file: PathBuf,

    /// Minimum market capitalization for reported matches
    #[arg(long, default_value_t = 1e8)]
    min_market_cap: f64,

    /// Override the maximum number of concurrent history fetches
    #[arg(long)]
    concurrency: Option<usize>,

    /// Emit the report as JSON instead of plain lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "fourbagger=info".into()),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_fetches = concurrency;
    }

    let symbols = universe::filter_standard(universe::load_symbols(&args.symbols_file)?);
    if symbols.is_empty() {
        error!("No usable symbols in {}", args.symbols_file.display());
        std::process::exit(1);
    }
    info!("Screening {} candidate symbols", symbols.len());

    let client = YahooClient::new(&config)?;
    let screener = Screener::new(Arc::new(client), config);
    let report = screener.run(&symbols, args.min_market_cap).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Stocks that quadrupled in value in the past year:");
        for symbol in &report.matches {
            println!("{}", symbol);
        }
        println!(
            "({} matched out of {} requested; {} fetched, {} failed)",
            report.matches.len(),
            report.requested,
            report.fetched,
            report.failed
        );
    }

    Ok(())
}
