//! Read-only view of what the strategy sees on the last closed candle.

use anyhow::Context;
use clap::Parser;
use trendbot::api::{BinanceClient, MarketDataSource, SymbolConstraintsSource};
use trendbot::indicators::compute_snapshots;
use trendbot::strategy::signals::last_closed_index;
use trendbot::BotConfig;

#[derive(Parser, Debug)]
#[command(about = "Print indicator snapshots and entry filters without trading")]
struct Args {
    /// Symbol to inspect (defaults to the configured one)
    #[arg(long)]
    symbol: Option<String>,

    /// Kline interval (defaults to the configured one)
    #[arg(long)]
    interval: Option<String>,

    /// Number of candles to fetch
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = BotConfig::load().context("Failed to load configuration")?;
    let symbol = args.symbol.unwrap_or_else(|| config.symbol.clone());
    let interval = args.interval.unwrap_or_else(|| config.interval.clone());
    let limit = args.limit.unwrap_or(config.candle_limit);

    // Public endpoints only, no credentials needed
    let client = BinanceClient::from_config(&config, None)?;

    println!("\n╔══════════════════════════════════════════════════════╗");
    println!("║     SIGNAL INSPECTION: {:<30}║", format!("{} {}", symbol, interval));
    println!("╚══════════════════════════════════════════════════════╝\n");

    let candles = client
        .get_candles(&symbol, &interval, limit)
        .await
        .context("Failed to fetch candles")?;
    let signal_config = config.signal_config();
    println!(
        "Candles: {} (strategy needs {})",
        candles.len(),
        signal_config.min_candles_required()
    );

    let Some(curr_idx) = last_closed_index(candles.len()) else {
        println!("⚠️  Not enough candles to find a closed pair");
        return Ok(());
    };

    let snapshots = compute_snapshots(&candles, &signal_config.periods);
    let (curr, prev) = (&snapshots[curr_idx], &snapshots[curr_idx - 1]);
    let close = candles[curr_idx].close;

    println!("\nLast closed candle @ {}", candles[curr_idx].open_time.format("%Y-%m-%d %H:%M"));
    println!("  close:     {}", close);
    println!("  ema_fast:  {:?} (prev {:?})", curr.ema_fast, prev.ema_fast);
    println!("  ema_slow:  {:?} (prev {:?})", curr.ema_slow, prev.ema_slow);
    println!("  ema_trend: {:?}", curr.ema_trend);
    println!("  rsi:       {:?}", curr.rsi);

    match signal_config.entry_checks(curr, prev, close) {
        Some(checks) => {
            let mark = |ok: bool| if ok { "✓" } else { "✗" };
            println!("\nFilters:");
            println!("  {} close above trend EMA", mark(checks.trend));
            println!("  {} fast EMA crossed above slow EMA", mark(checks.crossover));
            println!("  {} RSI above {}", mark(checks.momentum), signal_config.rsi_threshold);
            println!(
                "\n{}",
                if checks.all() { "📈 ENTRY SIGNAL" } else { "No entry" }
            );
        }
        None => println!("\n⏳ Indicators not warmed up yet"),
    }

    match client.get_symbol_constraints(&symbol).await {
        Ok(constraints) => println!(
            "\nExchange rules: step {} / min notional {} / price decimals {}",
            constraints.step_size, constraints.min_notional, constraints.price_precision
        ),
        Err(e) => println!("\n⚠️  Could not read exchange rules: {}", e),
    }

    Ok(())
}
