use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::{BalanceSource, MarketDataSource, OrderSink, SymbolConstraintsSource};
use crate::config::{BotConfig, Credentials};
use crate::error::ExchangeError;
use crate::models::{decimal_places, Candle, OrderAck, OrderRequest, SymbolConstraints};

// Binance allows 1200 request weight per minute; stay well below it
const REQUESTS_PER_SECOND: u32 = 10;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance spot REST client
///
/// Cloneable; all clones share the same rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    recv_window_ms: u64,
    rate_limiter: Arc<BinanceRateLimiter>,
}

/// Error body returned by Binance on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
    filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
enum SymbolFilter {
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize { step_size: String },
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    PriceFilter { tick_size: String },
    #[serde(rename = "NOTIONAL", rename_all = "camelCase")]
    Notional { min_notional: String },
    // Pre-2023 name of the notional filter
    #[serde(rename = "MIN_NOTIONAL", rename_all = "camelCase")]
    MinNotional { min_notional: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    free: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: u64,
    client_order_id: String,
    #[serde(default)]
    status: String,
}

impl BinanceClient {
    pub fn new(
        base_url: &str,
        credentials: Option<Credentials>,
        timeout: Duration,
        recv_window_ms: u64,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;

        let quota = Quota::per_second(NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            recv_window_ms,
            rate_limiter,
        })
    }

    pub fn from_config(
        config: &BotConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, ExchangeError> {
        Self::new(
            &config.base_url,
            credentials,
            Duration::from_secs(config.request_timeout_secs),
            config.recv_window_ms,
        )
    }

    /// HMAC-SHA256 of the query string, hex encoded
    fn sign(&self, query: &str) -> Result<String, ExchangeError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ExchangeError::Auth("API secret not configured".to_string()))?;

        sign_query(&credentials.secret_key, query)
    }

    fn api_key(&self) -> Result<&str, ExchangeError> {
        self.credentials
            .as_ref()
            .map(|c| c.api_key.as_str())
            .ok_or_else(|| ExchangeError::Auth("API key not configured".to_string()))
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}?{}", self.base_url, path, encode_query(params));

        self.rate_limiter.until_ready().await;
        let response = self.client.get(&url).send().await?;

        decode_response(response).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let mut params = params.to_vec();
        params.push(("recvWindow", self.recv_window_ms.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query = encode_query(&params);
        let signature = self.sign(&query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", self.api_key()?)
            .send()
            .await?;

        decode_response(response).await
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let rows: Vec<Vec<serde_json::Value>> = self
            .get_public(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let candles = rows.iter().map(|row| parse_kline(row)).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(symbol, interval, count = candles.len(), "Fetched klines");
        Ok(candles)
    }
}

#[async_trait]
impl BalanceSource for BinanceClient {
    async fn get_available_balance(&self, asset: &str) -> Result<f64, ExchangeError> {
        let account: AccountInfo = self.send_signed(Method::GET, "/api/v3/account", &[]).await?;

        match account.balances.iter().find(|b| b.asset == asset) {
            Some(balance) => parse_number(&balance.free, "free balance"),
            None => {
                tracing::debug!(asset, "Asset not present in account, balance is zero");
                Ok(0.0)
            }
        }
    }
}

#[async_trait]
impl SymbolConstraintsSource for BinanceClient {
    async fn get_symbol_constraints(&self, symbol: &str) -> Result<SymbolConstraints, ExchangeError> {
        let info: ExchangeInfo = self
            .get_public("/api/v3/exchangeInfo", &[("symbol", symbol.to_string())])
            .await?;

        let symbol_info = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| ExchangeError::Parse(format!("Symbol {} not in exchangeInfo", symbol)))?;

        constraints_from_filters(&symbol_info.filters)
    }
}

#[async_trait]
impl OrderSink for BinanceClient {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let response: OrderResponse = self
            .send_signed(Method::POST, "/api/v3/order", &order_params(order))
            .await?;

        Ok(OrderAck {
            order_id: response.order_id,
            client_order_id: response.client_order_id,
            status: response.status,
        })
    }
}

fn sign_query(secret: &str, query: &str) -> Result<String, ExchangeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Auth(e.to_string()))?;

    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

// Values are symbols, numbers and hex ids; none need percent-encoding
fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

fn order_params(order: &OrderRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", order.symbol.clone()),
        ("side", order.side.as_str().to_string()),
        ("type", order.order_type.as_str().to_string()),
        ("quantity", order.quantity.normalize().to_string()),
    ];
    if let Some(tif) = order.time_in_force {
        params.push(("timeInForce", tif.as_str().to_string()));
    }
    if let Some(price) = order.price {
        params.push(("price", price.normalize().to_string()));
    }
    if let Some(stop_price) = order.stop_price {
        params.push(("stopPrice", stop_price.normalize().to_string()));
    }
    params.push(("newClientOrderId", order.client_order_id.clone()));
    params
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ExchangeError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
        return Err(ExchangeError::RateLimited(status.as_u16()));
    }

    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => ExchangeError::Api {
                code: err.code,
                message: err.msg,
            },
            Err(_) => ExchangeError::Api {
                code: i64::from(status.as_u16()),
                message: body,
            },
        });
    }

    serde_json::from_str(&body).map_err(|e| ExchangeError::Parse(e.to_string()))
}

/// Kline row: `[openTime, open, high, low, close, volume, closeTime, ...]`
fn parse_kline(row: &[serde_json::Value]) -> Result<Candle, ExchangeError> {
    if row.len() < 7 {
        return Err(ExchangeError::Parse(format!(
            "Kline row has {} fields, expected at least 7",
            row.len()
        )));
    }

    let price = |i: usize, name: &str| -> Result<f64, ExchangeError> {
        row[i]
            .as_str()
            .ok_or_else(|| ExchangeError::Parse(format!("Kline {} is not a string", name)))
            .and_then(|s| parse_number(s, name))
    };

    Ok(Candle {
        open_time: parse_millis(&row[0], "open time")?,
        open: price(1, "open")?,
        high: price(2, "high")?,
        low: price(3, "low")?,
        close: price(4, "close")?,
        volume: price(5, "volume")?,
        close_time: parse_millis(&row[6], "close time")?,
    })
}

fn parse_millis(value: &serde_json::Value, name: &str) -> Result<DateTime<Utc>, ExchangeError> {
    value
        .as_i64()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| ExchangeError::Parse(format!("Invalid kline {}: {}", name, value)))
}

fn parse_number(value: &str, name: &str) -> Result<f64, ExchangeError> {
    value
        .parse()
        .map_err(|_| ExchangeError::Parse(format!("Invalid {}: {:?}", name, value)))
}

fn parse_decimal(value: &str, name: &str) -> Result<Decimal, ExchangeError> {
    value
        .parse()
        .map_err(|_| ExchangeError::Parse(format!("Invalid {}: {:?}", name, value)))
}

fn constraints_from_filters(filters: &[SymbolFilter]) -> Result<SymbolConstraints, ExchangeError> {
    let mut step_size = None;
    let mut min_notional = None;
    let mut price_precision = None;

    for filter in filters {
        match filter {
            SymbolFilter::LotSize { step_size: s } => {
                step_size = Some(parse_number(s, "stepSize")?);
            }
            SymbolFilter::PriceFilter { tick_size } => {
                price_precision = Some(decimal_places(parse_decimal(tick_size, "tickSize")?));
            }
            SymbolFilter::Notional { min_notional: n } | SymbolFilter::MinNotional { min_notional: n } => {
                min_notional = Some(parse_number(n, "minNotional")?);
            }
            SymbolFilter::Other => {}
        }
    }

    let missing = |name: &str| ExchangeError::Parse(format!("{} filter missing", name));

    Ok(SymbolConstraints {
        step_size: step_size.ok_or_else(|| missing("LOT_SIZE"))?,
        min_notional: min_notional.ok_or_else(|| missing("NOTIONAL"))?,
        price_precision: price_precision.ok_or_else(|| missing("PRICE_FILTER"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_matches_binance_reference() {
        // Example from the Binance API documentation
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        assert_eq!(
            sign_query(secret, query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_sign_without_credentials_fails() {
        let client = BinanceClient::new("http://localhost", None, Duration::from_secs(1), 5000).unwrap();
        assert!(matches!(client.sign("a=b"), Err(ExchangeError::Auth(_))));
    }

    #[test]
    fn test_parse_kline_row() {
        let row: Vec<serde_json::Value> = serde_json::from_value(json!([
            1499040000000u64, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
            "148976.11427815", 1499644799999u64, "2434.19055334", 308, "1756.87402397",
            "28.46694368", "0"
        ]))
        .unwrap();

        let candle = parse_kline(&row).unwrap();
        assert_eq!(candle.open_time.timestamp_millis(), 1499040000000);
        assert_eq!(candle.close, 0.015771);
        assert_eq!(candle.close_time.timestamp_millis(), 1499644799999);
    }

    #[test]
    fn test_parse_kline_rejects_short_row() {
        let row = vec![json!(1499040000000u64), json!("1.0")];
        assert!(matches!(parse_kline(&row), Err(ExchangeError::Parse(_))));
    }

    #[test]
    fn test_constraints_from_filters() {
        let filters: Vec<SymbolFilter> = serde_json::from_value(json!([
            {"filterType": "PRICE_FILTER", "minPrice": "0.00010000", "maxPrice": "1000.00000000", "tickSize": "0.00010000"},
            {"filterType": "LOT_SIZE", "minQty": "0.10000000", "maxQty": "9222449.00000000", "stepSize": "0.10000000"},
            {"filterType": "ICEBERG_PARTS", "limit": 50},
            {"filterType": "NOTIONAL", "minNotional": "5.00000000", "applyMinToMarket": true}
        ]))
        .unwrap();

        let constraints = constraints_from_filters(&filters).unwrap();
        assert_eq!(constraints.step_size, 0.1);
        assert_eq!(constraints.min_notional, 5.0);
        assert_eq!(constraints.price_precision, 4);
    }

    #[test]
    fn test_legacy_min_notional_filter() {
        let filters: Vec<SymbolFilter> = serde_json::from_value(json!([
            {"filterType": "PRICE_FILTER", "tickSize": "0.01000000"},
            {"filterType": "LOT_SIZE", "stepSize": "1.00000000"},
            {"filterType": "MIN_NOTIONAL", "minNotional": "10.00000000"}
        ]))
        .unwrap();

        let constraints = constraints_from_filters(&filters).unwrap();
        assert_eq!(constraints.min_notional, 10.0);
        assert_eq!(constraints.price_precision, 2);
    }

    #[test]
    fn test_missing_lot_size_filter() {
        let filters: Vec<SymbolFilter> = serde_json::from_value(json!([
            {"filterType": "PRICE_FILTER", "tickSize": "0.01000000"},
            {"filterType": "NOTIONAL", "minNotional": "10.00000000"}
        ]))
        .unwrap();

        let err = constraints_from_filters(&filters).unwrap_err();
        assert!(err.to_string().contains("LOT_SIZE"));
    }

    #[test]
    fn test_order_params_for_stop_loss() {
        let order = OrderRequest::stop_loss_sell("XRPUSDT", Decimal::new(19000, 1), Decimal::new(4950, 4));
        let params = order_params(&order);
        let query = encode_query(&params);

        assert!(query.starts_with("symbol=XRPUSDT&side=SELL&type=STOP_LOSS_LIMIT&quantity=1900&timeInForce=GTC"));
        assert!(query.contains("&price=0.495&stopPrice=0.495&"));
        assert!(query.contains(&format!("newClientOrderId={}", order.client_order_id)));
    }

    #[test]
    fn test_market_order_has_no_price_fields() {
        let order = OrderRequest::market_buy("XRPUSDT", Decimal::new(15, 0));
        let query = encode_query(&order_params(&order));

        assert!(!query.contains("price"));
        assert!(!query.contains("timeInForce"));
    }
}
