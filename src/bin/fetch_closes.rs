use anyhow::{Context, Result, bail};
use clap::Parser;
use csv::Writer;
use std::path::PathBuf;
use sentiment_move::config::{PriceLike, YAHOO, YahooApiConfig};
use sentiment_move::data::{GlobalRateLimiter, RetryPolicy, YahooProvider, fetch_with_retry};
use sentiment_move::utils::parse_date;

/// Dumps one ticker's daily closes to CSV, to eyeball the provider before a study.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    ticker: String,
    /// First date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: String,
    /// Last date, exclusive (YYYY-MM-DD)
    #[arg(long)]
    end: String,
    #[arg(long, short, default_value = "closes.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Validate the range
    let args = Args::parse();
    let start = parse_date(&args.start).with_context(|| format!("Bad start date '{}'", args.start))?;
    let end = parse_date(&args.end).with_context(|| format!("Bad end date '{}'", args.end))?;
    if start >= end {
        bail!("start {} must be before end {}", start, end);
    }
    let ticker = args.ticker.trim().to_ascii_uppercase();

    // 3. Fetch
    log::info!("Fetching {} daily closes for [{}, {})", ticker, start, end);
    let provider = YahooProvider::new(GlobalRateLimiter::per_minute(
        YAHOO.limits.requests_per_minute,
    ))?;
    let policy = RetryPolicy::from(&YahooApiConfig::default());
    let series = fetch_with_retry(&provider, &ticker, start, end, &policy)
        .await
        .with_context(|| format!("No closes for {}", ticker))?;

    // 4. Write
    let mut writer = Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create file: {:?}", args.output))?;
    writer.write_record(["date", "close"])?;
    for point in series.closes() {
        writer.write_record([point.date.to_string(), point.close.value().to_string()])?;
    }
    writer.flush()?;

    let first = series.first().map(|c| c.close.to_string()).unwrap_or_default();
    let last = series.last().map(|c| c.close.to_string()).unwrap_or_default();
    log::info!(
        "Wrote {} closes to {:?} (first {}, last {}, return {})",
        series.len(),
        args.output,
        first,
        last,
        series
            .window_return()
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string())
    );

    Ok(())
}
