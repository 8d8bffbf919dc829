pub mod binance;

pub use binance::BinanceClient;

use async_trait::async_trait;

use crate::error::ExchangeError;
use crate::models::{Candle, OrderAck, OrderRequest, SymbolConstraints};

/// Source of recent candles, oldest first
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;
}

/// Free (unlocked) balance of an asset
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn get_available_balance(&self, asset: &str) -> Result<f64, ExchangeError>;
}

/// Lot size, notional and price rules for a symbol
#[async_trait]
pub trait SymbolConstraintsSource: Send + Sync {
    async fn get_symbol_constraints(&self, symbol: &str) -> Result<SymbolConstraints, ExchangeError>;

    async fn get_lot_step_size(&self, symbol: &str) -> Result<f64, ExchangeError> {
        Ok(self.get_symbol_constraints(symbol).await?.step_size)
    }

    async fn get_min_notional(&self, symbol: &str) -> Result<f64, ExchangeError> {
        Ok(self.get_symbol_constraints(symbol).await?.min_notional)
    }

    async fn get_price_precision(&self, symbol: &str) -> Result<u32, ExchangeError> {
        Ok(self.get_symbol_constraints(symbol).await?.price_precision)
    }
}

/// Accepts orders for execution
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError>;
}

/// Everything the trading loop needs from an exchange
pub trait Exchange: MarketDataSource + BalanceSource + SymbolConstraintsSource + OrderSink {}

impl<T> Exchange for T where T: MarketDataSource + BalanceSource + SymbolConstraintsSource + OrderSink {}
