use crate::error::StrategyError;
use crate::indicators::IndicatorPeriods;
use crate::models::{Candle, IndicatorSnapshot};

/// Distance from the end of the series to the last fully closed candle.
///
/// The final candle returned by the exchange is still forming, so the
/// current bar is `n - CLOSED_CANDLE_OFFSET` and the previous bar is one
/// before it. Signals never look at the in-progress candle.
pub const CLOSED_CANDLE_OFFSET: usize = 2;

/// Configuration for signal generation
#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub periods: IndicatorPeriods,
    /// Momentum filter: RSI must be strictly above this
    pub rsi_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            periods: IndicatorPeriods::default(),
            rsi_threshold: 50.0,
        }
    }
}

/// Outcome of each entry filter for one pair of closed candles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryChecks {
    pub trend: bool,
    pub crossover: bool,
    pub momentum: bool,
}

impl EntryChecks {
    pub fn all(&self) -> bool {
        self.trend && self.crossover && self.momentum
    }
}

impl SignalConfig {
    /// Candles needed so both closed snapshots are fully warmed up
    pub fn min_candles_required(&self) -> usize {
        self.periods.longest() + CLOSED_CANDLE_OFFSET
    }

    /// Evaluate each filter; `None` when either snapshot is not warmed up
    pub fn entry_checks(
        &self,
        curr: &IndicatorSnapshot,
        prev: &IndicatorSnapshot,
        curr_close: f64,
    ) -> Option<EntryChecks> {
        let (Some(fast), Some(slow), Some(trend), Some(rsi)) =
            (curr.ema_fast, curr.ema_slow, curr.ema_trend, curr.rsi)
        else {
            return None;
        };
        if !prev.is_ready() {
            return None;
        }
        let (prev_fast, prev_slow) = (prev.ema_fast?, prev.ema_slow?);

        Some(EntryChecks {
            trend: curr_close > trend,
            crossover: prev_fast < prev_slow && fast > slow,
            momentum: rsi > self.rsi_threshold,
        })
    }

    /// Long entry fires only when trend, crossover and momentum all agree
    pub fn evaluate_entry(
        &self,
        curr: &IndicatorSnapshot,
        prev: &IndicatorSnapshot,
        curr_close: f64,
    ) -> bool {
        self.entry_checks(curr, prev, curr_close)
            .map(|checks| checks.all())
            .unwrap_or(false)
    }
}

/// Index of the last fully closed candle, if the series has one with a predecessor
pub fn last_closed_index(len: usize) -> Option<usize> {
    if len < CLOSED_CANDLE_OFFSET + 1 {
        return None;
    }
    Some(len - CLOSED_CANDLE_OFFSET)
}

/// Validate that candles are sorted by open time and well formed.
///
/// Missing intervals are allowed; exchange history has gaps around
/// maintenance windows and the indicators run over whatever was returned.
pub fn validate_candle_order(candles: &[Candle]) -> Result<(), StrategyError> {
    if let Some(candle) = candles.iter().find(|c| c.close_time < c.open_time) {
        return Err(StrategyError::MalformedCandles(format!(
            "Candle opened at {} closes before it opens",
            candle.open_time.format("%H:%M:%S")
        )));
    }

    for window in candles.windows(2) {
        let time_diff = (window[1].open_time - window[0].open_time).num_milliseconds();

        if time_diff <= 0 {
            return Err(StrategyError::MalformedCandles(format!(
                "Candles are not sorted by open time: {} then {}",
                window[0].open_time.format("%H:%M:%S"),
                window[1].open_time.format("%H:%M:%S")
            )));
        }
    }

    Ok(())
}
