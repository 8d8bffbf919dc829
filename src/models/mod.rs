use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLCV candlestick as returned by the exchange, oldest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
}

/// Indicator values aligned with one candle index.
///
/// Each field is `None` until its lookback window is warmed up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub ema_trend: Option<f64>,
    pub rsi: Option<f64>,
}

impl IndicatorSnapshot {
    /// True when every indicator is defined
    pub fn is_ready(&self) -> bool {
        self.ema_fast.is_some()
            && self.ema_slow.is_some()
            && self.ema_trend.is_some()
            && self.rsi.is_some()
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Enter long at the close of the last closed candle
    Buy { price: f64 },
    Hold,
}

/// Whether the agent currently holds the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    StopLossLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopLossLimit => "STOP_LOSS_LIMIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    GoodTillCancel,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GoodTillCancel => "GTC",
        }
    }
}

/// Which part of a bracket an order belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLeg {
    Entry,
    TakeProfit,
    StopLoss,
}

impl fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderLeg::Entry => "entry",
            OrderLeg::TakeProfit => "take-profit",
            OrderLeg::StopLoss => "stop-loss",
        };
        f.write_str(name)
    }
}

/// A single order ready to be sent to the exchange
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: String,
}

impl OrderRequest {
    pub fn market_buy(symbol: &str, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
            client_order_id: new_client_order_id(),
        }
    }

    pub fn limit_sell(symbol: &str, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            stop_price: None,
            time_in_force: Some(TimeInForce::GoodTillCancel),
            client_order_id: new_client_order_id(),
        }
    }

    /// Stop-limit sell with trigger and limit at the same price
    pub fn stop_loss_sell(symbol: &str, quantity: Decimal, stop_price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::StopLossLimit,
            quantity,
            price: Some(stop_price),
            stop_price: Some(stop_price),
            time_in_force: Some(TimeInForce::GoodTillCancel),
            client_order_id: new_client_order_id(),
        }
    }
}

fn new_client_order_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Exchange acknowledgement of an accepted order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: u64,
    pub client_order_id: String,
    pub status: String,
}

/// The three legs of a long entry, all with the same quantity
#[derive(Debug, Clone, PartialEq)]
pub struct BracketOrderSet {
    pub entry: OrderRequest,
    pub take_profit: OrderRequest,
    pub stop_loss: OrderRequest,
}

/// Exchange trading rules for one symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolConstraints {
    /// Lot size increment for quantities
    pub step_size: f64,
    /// Minimum order value in the quote asset
    pub min_notional: f64,
    /// Decimal places allowed in prices
    pub price_precision: u32,
}

/// Exact decimal for an `f64`, using its shortest round-trip representation
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    value.to_string().parse().ok()
}

/// Number of decimal places implied by an increment such as `0.0100`
pub fn decimal_places(increment: Decimal) -> u32 {
    increment.normalize().scale()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_readiness() {
        let mut snapshot = IndicatorSnapshot {
            ema_fast: Some(1.0),
            ema_slow: Some(1.0),
            ema_trend: Some(1.0),
            rsi: None,
        };
        assert!(!snapshot.is_ready());

        snapshot.rsi = Some(55.0);
        assert!(snapshot.is_ready());
    }

    #[test]
    fn test_stop_loss_order_uses_same_trigger_and_limit() {
        let order = OrderRequest::stop_loss_sell("XRPUSDT", Decimal::new(100, 0), Decimal::new(495, 3));

        assert_eq!(order.order_type, OrderType::StopLossLimit);
        assert_eq!(order.price, order.stop_price);
        assert_eq!(order.time_in_force, Some(TimeInForce::GoodTillCancel));
    }

    #[test]
    fn test_client_order_ids_are_unique() {
        let a = OrderRequest::market_buy("XRPUSDT", Decimal::ONE);
        let b = OrderRequest::market_buy("XRPUSDT", Decimal::ONE);
        assert_ne!(a.client_order_id, b.client_order_id);
        assert_eq!(a.client_order_id.len(), 32);
    }

    #[test]
    fn test_position_state_starts_flat() {
        assert_eq!(PositionState::default(), PositionState::Flat);
    }

    #[test]
    fn test_to_decimal_uses_shortest_representation() {
        assert_eq!(to_decimal(0.1), Some(Decimal::new(1, 1)));
        assert_eq!(to_decimal(0.33), Some(Decimal::new(33, 2)));
        assert_eq!(to_decimal(f64::NAN), None);
        assert_eq!(to_decimal(f64::INFINITY), None);
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places("0.00010000".parse().unwrap()), 4);
        assert_eq!(decimal_places("1.00000000".parse().unwrap()), 0);
        assert_eq!(decimal_places(Decimal::new(1, 1)), 1);
    }
}
