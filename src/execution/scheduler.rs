use std::future::Future;
use std::time::Duration;

use chrono::Utc;

use super::order_manager::{OpenPosition, OrderManager};
use super::position_sizer::PositionSizer;
use crate::api::Exchange;
use crate::config::BotConfig;
use crate::error::{CycleError, SizingRejection, StrategyError};
use crate::models::{PositionState, Signal, SymbolConstraints};
use crate::strategy::Strategy;

/// What a completed cycle did
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// No entry signal on the last closed candle
    NoSignal,
    /// Signal ignored because a position is already open
    EntrySuppressed,
    /// Signal fired but the sizer declined to trade
    SizingRejected(SizingRejection),
    Entered(OpenPosition),
}

/// Single-task polling loop: fetch, evaluate, maybe enter, sleep.
pub struct TradingLoop<E, S> {
    exchange: E,
    strategy: S,
    sizer: PositionSizer,
    orders: OrderManager,
    symbol: String,
    quote_asset: String,
    interval: String,
    candle_limit: usize,
    poll_interval: Duration,
}

impl<E, S> TradingLoop<E, S>
where
    E: Exchange,
    S: Strategy,
{
    pub fn new(config: &BotConfig, exchange: E, strategy: S) -> Self {
        let fallback = SymbolConstraints {
            step_size: config.fallback_step_size,
            min_notional: config.fallback_min_notional,
            price_precision: config.fallback_price_precision,
        };

        Self {
            exchange,
            strategy,
            sizer: PositionSizer::new(config.capital_fraction, fallback),
            orders: OrderManager::new(&config.symbol, config.take_profit_pct, config.stop_loss_pct),
            symbol: config.symbol.clone(),
            quote_asset: config.quote_asset.clone(),
            interval: config.interval.clone(),
            candle_limit: config.candle_limit,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    pub fn position_state(&self) -> PositionState {
        self.orders.state()
    }

    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Run one evaluation cycle to completion
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let candles = self
            .exchange
            .get_candles(&self.symbol, &self.interval, self.candle_limit)
            .await
            .map_err(CycleError::DataFetch)?;

        let price = match self.strategy.generate_signal(&candles)? {
            Signal::Hold => return Ok(CycleOutcome::NoSignal),
            Signal::Buy { price } => price,
        };

        if self.orders.state() == PositionState::Long {
            return Ok(CycleOutcome::EntrySuppressed);
        }

        tracing::info!(symbol = %self.symbol, price, strategy = self.strategy.name(), "Signal LONG");

        let plan = match self
            .sizer
            .size_entry(&self.exchange, &self.symbol, &self.quote_asset, price)
            .await
        {
            Ok(plan) => plan,
            Err(rejection) => return Ok(CycleOutcome::SizingRejected(rejection)),
        };

        let position = self
            .orders
            .open_long(&self.exchange, plan.quantity, price, plan.price_precision)
            .await?;

        Ok(CycleOutcome::Entered(position))
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// A cycle is never interrupted; shutdown is observed during the
    /// fixed delay that follows every cycle, failed or not.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            symbol = %self.symbol,
            interval = %self.interval,
            strategy = self.strategy.name(),
            poll_secs = self.poll_interval.as_secs(),
            "🚀 Trading loop started"
        );

        tokio::pin!(shutdown);

        loop {
            let result = self.run_cycle().await;
            self.report(&result);

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, leaving trading loop");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    fn report(&self, result: &Result<CycleOutcome, CycleError>) {
        match result {
            Ok(CycleOutcome::NoSignal) => {
                tracing::info!("[{}] Waiting for signal...", Utc::now().format("%H:%M:%S"));
            }
            Ok(CycleOutcome::EntrySuppressed) => {
                tracing::info!("Entry signal ignored, position already open");
            }
            Ok(CycleOutcome::SizingRejected(rejection)) => {
                tracing::info!(reason = %rejection, "Entry skipped by position sizer");
            }
            Ok(CycleOutcome::Entered(position)) => {
                tracing::info!(
                    quantity = %position.quantity,
                    entry = %position.entry_price,
                    protected = position.is_protected(),
                    "Position opened"
                );
            }
            Err(CycleError::Strategy(StrategyError::InsufficientData { available, required })) => {
                tracing::warn!(available, required, "⏳ Not enough data yet");
            }
            Err(e) => {
                tracing::error!(error = %e, "⚠️  Cycle failed, retrying after delay");
            }
        }
    }
}
