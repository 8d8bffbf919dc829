// Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;
use trendbot::api::{BalanceSource, MarketDataSource, OrderSink, SymbolConstraintsSource};
use trendbot::error::{ExchangeError, StrategyError};
use trendbot::models::{Candle, OrderAck, OrderRequest, OrderType, Signal, SymbolConstraints};
use trendbot::{BotConfig, Strategy};

/// Build one-minute candles from closing prices
pub fn create_test_candles(closes: &[f64]) -> Vec<Candle> {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open_time = base + Duration::minutes(i as i64);
            Candle {
                open_time,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
                close_time: open_time + Duration::milliseconds(59_999),
            }
        })
        .collect()
}

/// In-memory exchange with scripted responses
pub struct MockExchange {
    /// Responses for successive candle fetches; empty queue means a flat series
    candle_responses: Mutex<VecDeque<Result<Vec<Candle>, ExchangeError>>>,
    balance: Mutex<Option<f64>>,
    constraints: Option<SymbolConstraints>,
    fail_order_types: Vec<OrderType>,
    fetch_times: Mutex<Vec<Instant>>,
    submitted: Mutex<Vec<OrderRequest>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            candle_responses: Mutex::new(VecDeque::new()),
            balance: Mutex::new(Some(1000.0)),
            constraints: Some(SymbolConstraints {
                step_size: 0.1,
                min_notional: 5.0,
                price_precision: 4,
            }),
            fail_order_types: Vec::new(),
            fetch_times: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fetch_failure(self) -> Self {
        self.candle_responses
            .lock()
            .unwrap()
            .push_back(Err(ExchangeError::Api {
                code: -1003,
                message: "Too much request weight used".to_string(),
            }));
        self
    }

    pub fn with_candles(self, candles: Vec<Candle>) -> Self {
        self.candle_responses.lock().unwrap().push_back(Ok(candles));
        self
    }

    pub fn with_balance(self, balance: Option<f64>) -> Self {
        *self.balance.lock().unwrap() = balance;
        self
    }

    pub fn without_constraints(mut self) -> Self {
        self.constraints = None;
        self
    }

    pub fn failing_orders(mut self, order_types: Vec<OrderType>) -> Self {
        self.fail_order_types = order_types;
        self
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_times.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for MockExchange {
    async fn get_candles(
        &self,
        _symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.fetch_times.lock().unwrap().push(Instant::now());

        match self.candle_responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(create_test_candles(&vec![1.0; limit])),
        }
    }
}

#[async_trait]
impl BalanceSource for MockExchange {
    async fn get_available_balance(&self, _asset: &str) -> Result<f64, ExchangeError> {
        self.balance
            .lock()
            .unwrap()
            .ok_or_else(|| ExchangeError::Auth("Invalid API-key".to_string()))
    }
}

#[async_trait]
impl SymbolConstraintsSource for MockExchange {
    async fn get_symbol_constraints(&self, symbol: &str) -> Result<SymbolConstraints, ExchangeError> {
        self.constraints
            .ok_or_else(|| ExchangeError::Parse(format!("Symbol {} not in exchangeInfo", symbol)))
    }
}

#[async_trait]
impl OrderSink for MockExchange {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(order.clone());

        if self.fail_order_types.contains(&order.order_type) {
            return Err(ExchangeError::Api {
                code: -2010,
                message: "Account has insufficient balance for requested action.".to_string(),
            });
        }

        Ok(OrderAck {
            order_id: submitted.len() as u64,
            client_order_id: order.client_order_id.clone(),
            status: "NEW".to_string(),
        })
    }
}

/// Strategy that always returns the same signal
pub struct FixedSignalStrategy {
    pub signal: Signal,
}

impl Strategy for FixedSignalStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal, StrategyError> {
        if candles.len() < self.min_candles_required() {
            return Err(StrategyError::InsufficientData {
                available: candles.len(),
                required: self.min_candles_required(),
            });
        }
        Ok(self.signal)
    }

    fn name(&self) -> &str {
        "FixedSignalStrategy"
    }

    fn min_candles_required(&self) -> usize {
        3
    }
}

/// Default configuration with a one-minute poll
pub fn create_test_config() -> BotConfig {
    BotConfig::default()
}
