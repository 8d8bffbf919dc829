//! Error types shared across the trading pipeline.
//!
//! Each stage returns its own typed error; the scheduler matches on
//! [`CycleError`] to decide how a failed cycle is reported.

use thiserror::Error;

use crate::models::OrderLeg;

/// Failure talking to the exchange
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    Api { code: i64, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded (HTTP {0})")]
    RateLimited(u16),
}

/// Strategy could not evaluate the candle series
#[derive(Error, Debug, PartialEq)]
pub enum StrategyError {
    #[error("Insufficient data: {available} candles, need {required}")]
    InsufficientData { available: usize, required: usize },

    #[error("Malformed candle series: {0}")]
    MalformedCandles(String),
}

/// Reason the sizer declined to produce a quantity
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SizingRejection {
    #[error("insufficient balance ({balance})")]
    InsufficientBalance { balance: f64 },

    #[error("order value {notional} below minimum notional {min_notional}")]
    BelowMinimumNotional { notional: f64, min_notional: f64 },

    #[error("non-positive price ({price})")]
    NonPositivePrice { price: f64 },

    #[error("invalid lot step size ({step_size})")]
    InvalidStepSize { step_size: f64 },
}

/// A bracket leg was not accepted
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("{leg} order failed: {source}")]
    Submission {
        leg: OrderLeg,
        #[source]
        source: ExchangeError,
    },

    #[error("{leg} order could not be built: {reason}")]
    InvalidOrder { leg: OrderLeg, reason: String },

    #[error("position already open")]
    AlreadyInPosition,
}

impl OrderError {
    pub fn leg(&self) -> Option<OrderLeg> {
        match self {
            OrderError::Submission { leg, .. } | OrderError::InvalidOrder { leg, .. } => {
                Some(*leg)
            }
            OrderError::AlreadyInPosition => None,
        }
    }
}

/// Anything that aborts a single polling cycle
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("data fetch failed: {0}")]
    DataFetch(#[source] ExchangeError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("entry order failed: {0}")]
    Order(#[from] OrderError),
}

/// Invalid or missing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}
