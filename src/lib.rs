// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod strategy;

// Re-export commonly used types
pub use crate::config::{BotConfig, Credentials};
pub use crate::error::{CycleError, ExchangeError, OrderError, SizingRejection, StrategyError};
pub use models::*;
pub use strategy::Strategy;
