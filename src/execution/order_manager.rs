use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::api::OrderSink;
use crate::error::OrderError;
use crate::models::{
    to_decimal, BracketOrderSet, OrderAck, OrderLeg, OrderRequest, PositionState,
};

/// The long position opened by this process
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub symbol: String,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub take_profit_price: Decimal,
    pub stop_loss_price: Decimal,
    pub entry_order: OrderAck,
    pub take_profit_order: Option<OrderAck>,
    pub stop_loss_order: Option<OrderAck>,
    pub opened_at: DateTime<Utc>,
}

impl OpenPosition {
    /// Both exit legs are resting on the exchange
    pub fn is_protected(&self) -> bool {
        self.take_profit_order.is_some() && self.stop_loss_order.is_some()
    }
}

/// Issues bracket orders and owns the position state.
///
/// State moves FLAT -> LONG as soon as the entry order is accepted, even when
/// an exit leg is rejected afterwards. Nothing moves it back to FLAT.
#[derive(Debug)]
pub struct OrderManager {
    symbol: String,
    take_profit_pct: f64,
    stop_loss_pct: f64,
    state: PositionState,
    position: Option<OpenPosition>,
}

impl OrderManager {
    pub fn new(symbol: &str, take_profit_pct: f64, stop_loss_pct: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            take_profit_pct,
            stop_loss_pct,
            state: PositionState::Flat,
            position: None,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        self.position.as_ref()
    }

    /// Build the three legs for a long entry at `entry_price`.
    ///
    /// Exit prices are rounded to `price_precision` and must keep
    /// take-profit > entry > stop.
    pub fn build_bracket(
        &self,
        quantity: Decimal,
        entry_price: f64,
        price_precision: u32,
    ) -> Result<BracketOrderSet, OrderError> {
        let invalid = |leg: OrderLeg, reason: String| OrderError::InvalidOrder { leg, reason };

        let entry = to_decimal(entry_price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| invalid(OrderLeg::Entry, format!("bad entry price {}", entry_price)))?;
        if quantity <= Decimal::ZERO {
            return Err(invalid(OrderLeg::Entry, format!("bad quantity {}", quantity)));
        }

        let tp_factor = to_decimal(1.0 + self.take_profit_pct)
            .ok_or_else(|| invalid(OrderLeg::TakeProfit, "bad take-profit pct".to_string()))?;
        let sl_factor = to_decimal(1.0 - self.stop_loss_pct)
            .ok_or_else(|| invalid(OrderLeg::StopLoss, "bad stop-loss pct".to_string()))?;

        let take_profit_price = (entry * tp_factor).round_dp(price_precision).normalize();
        let stop_loss_price = (entry * sl_factor).round_dp(price_precision).normalize();

        if take_profit_price <= entry {
            return Err(invalid(
                OrderLeg::TakeProfit,
                format!("take-profit {} not above entry {}", take_profit_price, entry),
            ));
        }
        if stop_loss_price >= entry || stop_loss_price <= Decimal::ZERO {
            return Err(invalid(
                OrderLeg::StopLoss,
                format!("stop {} not below entry {}", stop_loss_price, entry),
            ));
        }

        Ok(BracketOrderSet {
            entry: OrderRequest::market_buy(&self.symbol, quantity),
            take_profit: OrderRequest::limit_sell(&self.symbol, quantity, take_profit_price),
            stop_loss: OrderRequest::stop_loss_sell(&self.symbol, quantity, stop_loss_price),
        })
    }

    /// Enter long with a market buy, then rest take-profit and stop-loss sells.
    ///
    /// Returns an error only when nothing was bought. Exit leg failures are
    /// logged and recorded on the returned position; earlier legs are never
    /// rolled back.
    pub async fn open_long<S>(
        &mut self,
        sink: &S,
        quantity: Decimal,
        entry_price: f64,
        price_precision: u32,
    ) -> Result<OpenPosition, OrderError>
    where
        S: OrderSink + ?Sized,
    {
        if self.state == PositionState::Long {
            return Err(OrderError::AlreadyInPosition);
        }

        let bracket = self.build_bracket(quantity, entry_price, price_precision)?;

        let entry_order = sink
            .submit_order(&bracket.entry)
            .await
            .map_err(|source| OrderError::Submission {
                leg: OrderLeg::Entry,
                source,
            })?;

        self.state = PositionState::Long;
        tracing::info!(
            symbol = %self.symbol,
            quantity = %quantity,
            entry_price,
            order_id = entry_order.order_id,
            "📈 Entry order accepted, position is LONG"
        );

        let take_profit_order = self.submit_exit(sink, OrderLeg::TakeProfit, &bracket.take_profit).await;
        let stop_loss_order = self.submit_exit(sink, OrderLeg::StopLoss, &bracket.stop_loss).await;

        let position = OpenPosition {
            symbol: self.symbol.clone(),
            entry_price: to_decimal(entry_price).unwrap_or_default(),
            quantity,
            take_profit_price: bracket.take_profit.price.unwrap_or_default(),
            stop_loss_price: bracket.stop_loss.stop_price.unwrap_or_default(),
            entry_order,
            take_profit_order,
            stop_loss_order,
            opened_at: Utc::now(),
        };

        if position.is_protected() {
            tracing::info!(
                take_profit = %position.take_profit_price,
                stop_loss = %position.stop_loss_price,
                "✅ TP/SL orders placed for {} {}",
                quantity,
                self.symbol
            );
        } else {
            tracing::warn!(
                take_profit_resting = position.take_profit_order.is_some(),
                stop_loss_resting = position.stop_loss_order.is_some(),
                "⚠️  Position is open without a full set of exit orders"
            );
        }

        self.position = Some(position.clone());
        Ok(position)
    }

    async fn submit_exit<S>(&self, sink: &S, leg: OrderLeg, order: &OrderRequest) -> Option<OrderAck>
    where
        S: OrderSink + ?Sized,
    {
        match sink.submit_order(order).await {
            Ok(ack) => {
                tracing::debug!(%leg, order_id = ack.order_id, "Exit order accepted");
                Some(ack)
            }
            Err(source) => {
                let err = OrderError::Submission { leg, source };
                tracing::error!(%leg, error = %err, "❌ Exit order rejected");
                None
            }
        }
    }
}
