use serde::Deserialize;

use crate::error::ConfigError;
use crate::indicators::IndicatorPeriods;
use crate::strategy::signals::SignalConfig;

const CONFIG_FILE: &str = "trendbot";
const ENV_PREFIX: &str = "TRENDBOT";

/// Runtime configuration for the trading agent
///
/// Layered as: built-in defaults, optional `trendbot.toml`, then
/// `TRENDBOT_*` environment variables (e.g. `TRENDBOT_SYMBOL=XRPUSDC`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub symbol: String,
    /// Asset whose free balance funds entries (USDT or USDC)
    pub quote_asset: String,
    /// Kline interval, exchange notation ("1m", "5m", ...)
    pub interval: String,
    pub poll_interval_secs: u64,
    pub candle_limit: usize,
    pub capital_fraction: f64,

    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_trend: usize,
    pub rsi_period: usize,
    pub rsi_threshold: f64,

    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,

    // Used when exchangeInfo cannot be read
    pub fallback_step_size: f64,
    pub fallback_min_notional: f64,
    pub fallback_price_precision: u32,

    pub base_url: String,
    pub recv_window_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbol: "XRPUSDT".to_string(),
            quote_asset: "USDT".to_string(),
            interval: "1m".to_string(),
            poll_interval_secs: 60,
            candle_limit: 250,
            capital_fraction: 0.95,
            ema_fast: 9,
            ema_slow: 50,
            ema_trend: 200,
            rsi_period: 14,
            rsi_threshold: 50.0,
            take_profit_pct: 0.02,
            stop_loss_pct: 0.01,
            fallback_step_size: 1.0,
            fallback_min_notional: 10.0,
            fallback_price_precision: 4,
            base_url: "https://api.binance.com".to_string(),
            recv_window_ms: 5000,
            request_timeout_secs: 10,
        }
    }
}

impl BotConfig {
    /// Load and validate configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(CONFIG_FILE).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.symbol.is_empty() || self.quote_asset.is_empty() {
            return invalid("symbol and quote_asset must be set".to_string());
        }
        if !self.symbol.ends_with(&self.quote_asset) {
            return invalid(format!(
                "symbol {} is not quoted in {}",
                self.symbol, self.quote_asset
            ));
        }
        if self.poll_interval_secs == 0 {
            return invalid("poll_interval_secs must be positive".to_string());
        }
        if !(self.capital_fraction > 0.0 && self.capital_fraction <= 1.0) {
            return invalid(format!(
                "capital_fraction must be in (0, 1], got {}",
                self.capital_fraction
            ));
        }
        if self.ema_fast == 0 || self.rsi_period == 0 {
            return invalid("indicator windows must be positive".to_string());
        }
        if !(self.ema_fast < self.ema_slow && self.ema_slow <= self.ema_trend) {
            return invalid(format!(
                "expected ema_fast < ema_slow <= ema_trend, got {}/{}/{}",
                self.ema_fast, self.ema_slow, self.ema_trend
            ));
        }
        if !(self.take_profit_pct > 0.0 && self.take_profit_pct < 1.0) {
            return invalid(format!(
                "take_profit_pct must be in (0, 1), got {}",
                self.take_profit_pct
            ));
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return invalid(format!(
                "stop_loss_pct must be in (0, 1), got {}",
                self.stop_loss_pct
            ));
        }
        if !(self.fallback_step_size > 0.0 && self.fallback_min_notional > 0.0) {
            return invalid("fallback constraints must be positive".to_string());
        }
        let required = self.signal_config().min_candles_required();
        if self.candle_limit < required {
            return invalid(format!(
                "candle_limit {} too small, need at least {}",
                self.candle_limit, required
            ));
        }

        Ok(())
    }

    pub fn indicator_periods(&self) -> IndicatorPeriods {
        IndicatorPeriods {
            ema_fast: self.ema_fast,
            ema_slow: self.ema_slow,
            ema_trend: self.ema_trend,
            rsi: self.rsi_period,
        }
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            periods: self.indicator_periods(),
            rsi_threshold: self.rsi_threshold,
        }
    }
}

/// API credentials, read from the environment only
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("BINANCE_API_KEY")
            .map_err(|_| ConfigError::MissingEnv("BINANCE_API_KEY"))?;
        let secret_key = std::env::var("BINANCE_SECRET_KEY")
            .map_err(|_| ConfigError::MissingEnv("BINANCE_SECRET_KEY"))?;

        Ok(Self {
            api_key,
            secret_key,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
