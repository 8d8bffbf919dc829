// Trading strategy module
pub mod ema_cross;
pub mod signals;

pub use ema_cross::EmaCrossStrategy;

use crate::error::StrategyError;
use crate::models::{Candle, Signal};

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal based on market data
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal, StrategyError>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
