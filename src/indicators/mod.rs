// Technical indicators module
// EMA and RSI series plus the per-candle snapshot engine

pub mod moving_average;
pub mod rsi;

pub use moving_average::calculate_ema_series;
pub use rsi::calculate_rsi_series;

use crate::models::{Candle, IndicatorSnapshot};

/// Lookback windows for the indicator engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPeriods {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_trend: usize,
    pub rsi: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 50,
            ema_trend: 200,
            rsi: 14,
        }
    }
}

impl IndicatorPeriods {
    /// Longest lookback among all indicators
    pub fn longest(&self) -> usize {
        self.ema_fast
            .max(self.ema_slow)
            .max(self.ema_trend)
            .max(self.rsi + 1)
    }
}

/// Compute one snapshot per candle, index-aligned with `candles`.
///
/// Short series are fine: fields whose window is not yet filled stay `None`.
pub fn compute_snapshots(candles: &[Candle], periods: &IndicatorPeriods) -> Vec<IndicatorSnapshot> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let ema_fast = calculate_ema_series(&closes, periods.ema_fast);
    let ema_slow = calculate_ema_series(&closes, periods.ema_slow);
    let ema_trend = calculate_ema_series(&closes, periods.ema_trend);
    let rsi = calculate_rsi_series(&closes, periods.rsi);

    (0..closes.len())
        .map(|i| IndicatorSnapshot {
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            ema_trend: ema_trend[i],
            rsi: rsi[i],
        })
        .collect()
}
