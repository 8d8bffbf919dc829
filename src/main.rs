use anyhow::Context;
use trendbot::api::BinanceClient;
use trendbot::execution::TradingLoop;
use trendbot::strategy::EmaCrossStrategy;
use trendbot::{BotConfig, Credentials};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    tracing::info!("✅ Trendbot starting");

    let config = BotConfig::load().context("Failed to load configuration")?;
    let credentials = Credentials::from_env().context("Binance credentials not found")?;

    tracing::info!("📊 Configuration:");
    tracing::info!("  Symbol: {} ({})", config.symbol, config.interval);
    tracing::info!("  Quote asset: {}", config.quote_asset);
    tracing::info!("  Capital fraction: {}%", config.capital_fraction * 100.0);
    tracing::info!(
        "  EMA {}/{}/{}, RSI {} > {}",
        config.ema_fast,
        config.ema_slow,
        config.ema_trend,
        config.rsi_period,
        config.rsi_threshold
    );
    tracing::info!(
        "  TP +{}% / SL -{}%",
        config.take_profit_pct * 100.0,
        config.stop_loss_pct * 100.0
    );
    tracing::info!("  Poll every {}s", config.poll_interval_secs);

    let client = BinanceClient::from_config(&config, Some(credentials))
        .context("Failed to build exchange client")?;
    let strategy = EmaCrossStrategy::new(config.signal_config());

    let mut trading_loop = TradingLoop::new(&config, client, strategy);

    tracing::info!("Press Ctrl+C to stop...");
    trading_loop
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    if let Some(position) = trading_loop.orders().position() {
        tracing::warn!(
            "Exiting with an open position: {} {} @ {} (exit orders resting: {})",
            position.quantity,
            position.symbol,
            position.entry_price,
            position.is_protected()
        );
    }

    tracing::info!("👋 Trendbot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trendbot=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
