use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::api::{BalanceSource, SymbolConstraintsSource};
use crate::error::{ExchangeError, SizingRejection};
use crate::models::{decimal_places, to_decimal, SymbolConstraints};

/// Tradable quantity, or the reason no order should be placed
pub type SizingResult = Result<Decimal, SizingRejection>;

/// Size an entry from the available quote balance.
///
/// `raw = balance * capital_fraction / price`, floored to a multiple of
/// `step_size` and expressed with the step's precision. The order value must
/// reach `min_notional`.
pub fn size(
    available_balance: f64,
    price: f64,
    capital_fraction: f64,
    step_size: f64,
    min_notional: f64,
) -> SizingResult {
    let price_dec = match to_decimal(price) {
        Some(p) if p > Decimal::ZERO => p,
        _ => return Err(SizingRejection::NonPositivePrice { price }),
    };
    let balance_dec = match to_decimal(available_balance) {
        Some(b) if b > Decimal::ZERO => b,
        _ => {
            return Err(SizingRejection::InsufficientBalance {
                balance: available_balance,
            })
        }
    };
    let step = match to_decimal(step_size) {
        Some(s) if s > Decimal::ZERO => s,
        _ => return Err(SizingRejection::InvalidStepSize { step_size }),
    };
    let fraction = to_decimal(capital_fraction)
        .filter(|f| *f > Decimal::ZERO)
        .ok_or(SizingRejection::InsufficientBalance {
            balance: available_balance,
        })?;

    let below_minimum = |notional: f64| SizingRejection::BelowMinimumNotional {
        notional,
        min_notional,
    };

    let raw = balance_dec
        .checked_mul(fraction)
        .and_then(|budget| budget.checked_div(price_dec))
        .ok_or(below_minimum(0.0))?;
    let remainder = raw.checked_rem(step).ok_or(below_minimum(0.0))?;
    let quantity = (raw - remainder)
        .round_dp(decimal_places(step))
        .normalize();

    let notional = quantity
        .checked_mul(price_dec)
        .and_then(|n| n.to_f64())
        .unwrap_or(0.0);
    if quantity <= Decimal::ZERO || notional < min_notional {
        return Err(below_minimum(notional));
    }

    Ok(quantity)
}

/// Sized entry plus the price precision exit legs must use
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPlan {
    pub quantity: Decimal,
    pub price_precision: u32,
}

/// Reads balance and symbol rules from the exchange and sizes entries.
///
/// Read failures fail closed: an unreadable balance counts as zero and
/// unreadable symbol rules fall back to conservative defaults.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    capital_fraction: f64,
    fallback: SymbolConstraints,
}

impl PositionSizer {
    pub fn new(capital_fraction: f64, fallback: SymbolConstraints) -> Self {
        Self {
            capital_fraction,
            fallback,
        }
    }

    pub async fn size_entry<E>(
        &self,
        exchange: &E,
        symbol: &str,
        quote_asset: &str,
        price: f64,
    ) -> Result<EntryPlan, SizingRejection>
    where
        E: BalanceSource + SymbolConstraintsSource + ?Sized,
    {
        let balance = match exchange.get_available_balance(quote_asset).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(asset = quote_asset, error = %e, "Balance unavailable, treating as zero");
                0.0
            }
        };

        let step_size = exchange.get_lot_step_size(symbol).await;
        let min_notional = exchange.get_min_notional(symbol).await;
        let price_precision = exchange.get_price_precision(symbol).await;

        let step_size = self.or_fallback(symbol, "step size", step_size, self.fallback.step_size);
        let min_notional =
            self.or_fallback(symbol, "min notional", min_notional, self.fallback.min_notional);
        let price_precision = self.or_fallback(
            symbol,
            "price precision",
            price_precision,
            self.fallback.price_precision,
        );

        let quantity = size(balance, price, self.capital_fraction, step_size, min_notional)?;

        tracing::debug!(
            balance,
            price,
            quantity = %quantity,
            step_size,
            "Sized entry"
        );

        Ok(EntryPlan {
            quantity,
            price_precision,
        })
    }

    fn or_fallback<T>(&self, symbol: &str, rule: &str, value: Result<T, ExchangeError>, fallback: T) -> T
    where
        T: std::fmt::Debug,
    {
        match value {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(symbol, rule, error = %e, fallback = ?fallback, "Symbol rule unavailable, using fallback");
                fallback
            }
        }
    }
}
