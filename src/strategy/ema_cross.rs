use super::{
    signals::{last_closed_index, validate_candle_order, SignalConfig},
    Strategy,
};
use crate::error::StrategyError;
use crate::indicators::compute_snapshots;
use crate::models::{Candle, Signal};

/// Trend-following EMA crossover strategy
///
/// Goes long when, on the last closed candle:
/// - close is above the trend EMA
/// - the fast EMA has just crossed above the slow EMA
/// - RSI confirms upward momentum
#[derive(Debug, Clone, Default)]
pub struct EmaCrossStrategy {
    config: SignalConfig,
}

impl EmaCrossStrategy {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Strategy for EmaCrossStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal, StrategyError> {
        let required = self.min_candles_required();
        if candles.len() < required {
            return Err(StrategyError::InsufficientData {
                available: candles.len(),
                required,
            });
        }

        validate_candle_order(candles)?;

        let snapshots = compute_snapshots(candles, &self.config.periods);
        let curr_idx = last_closed_index(candles.len()).ok_or(StrategyError::InsufficientData {
            available: candles.len(),
            required,
        })?;
        let close = candles[curr_idx].close;

        let checks = self
            .config
            .entry_checks(&snapshots[curr_idx], &snapshots[curr_idx - 1], close);

        tracing::debug!(
            close,
            snapshot = ?snapshots[curr_idx],
            checks = ?checks,
            "Evaluated last closed candle"
        );

        match checks {
            Some(checks) if checks.all() => Ok(Signal::Buy { price: close }),
            _ => Ok(Signal::Hold),
        }
    }

    fn name(&self) -> &str {
        "EmaCrossStrategy"
    }

    fn min_candles_required(&self) -> usize {
        self.config.min_candles_required()
    }
}
