use chrono::DateTime;
use radar_core::{Candle, GlobalSnapshot, RadarError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

const BINANCE_SPOT_URL: &str = "https://api.binance.com/api/v3/klines";
const BINANCE_FUTURES_URL: &str = "https://fapi.binance.com/fapi/v1/premiumIndex";
const FNG_URL: &str = "https://api.alternative.me/fng/";
const COINGECKO_GLOBAL_URL: &str = "https://api.coingecko.com/api/v3/global";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Neutral fear & greed reading used when the sentiment provider is down
const NEUTRAL_FEAR: u32 = 50;

/// Client for the upstream market data providers.
///
/// Every public fetcher degrades to its documented neutral fallback on any
/// upstream fault: the caller never sees a provider error, only a warning
/// in the log and a value the engine can safely run on.
pub struct MarketDataClient {
    client: Client,
    spot_url: String,
    futures_url: String,
    fng_url: String,
    global_url: String,
}

impl MarketDataClient {
    pub fn new() -> Self {
        Self::with_endpoints(
            BINANCE_SPOT_URL,
            BINANCE_FUTURES_URL,
            FNG_URL,
            COINGECKO_GLOBAL_URL,
        )
    }

    /// Point the client at alternative endpoints (tests, mirrors).
    pub fn with_endpoints(
        spot_url: impl Into<String>,
        futures_url: impl Into<String>,
        fng_url: impl Into<String>,
        global_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            spot_url: spot_url.into(),
            futures_url: futures_url.into(),
            fng_url: fng_url.into(),
            global_url: global_url.into(),
        }
    }

    /// Latest daily candles, oldest first. Falls back to an empty history.
    pub async fn daily_candles(&self, symbol: &str, limit: u32) -> Vec<Candle> {
        match self.try_daily_candles(symbol, limit).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!("candle fetch failed, degrading to empty history: {}", e);
                Vec::new()
            }
        }
    }

    /// Current funding rate as a signed fraction. Falls back to 0.0.
    pub async fn funding_rate(&self, symbol: &str) -> f64 {
        match self.try_funding_rate(symbol).await {
            Ok(rate) => rate,
            Err(e) => {
                warn!("funding rate fetch failed, treating as neutral: {}", e);
                0.0
            }
        }
    }

    /// Fear & greed index in [0, 100]. Falls back to 50.
    pub async fn fear_greed(&self) -> u32 {
        match self.try_fear_greed().await {
            Ok(value) => value.min(100),
            Err(e) => {
                warn!("fear & greed fetch failed, treating as neutral: {}", e);
                NEUTRAL_FEAR
            }
        }
    }

    /// Global market snapshot. Falls back to both fields unknown; absence
    /// must propagate, because 0.0 is a meaningful reading for both.
    pub async fn global_snapshot(&self) -> GlobalSnapshot {
        match self.try_global_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("global snapshot fetch failed, leaving fields unknown: {}", e);
                GlobalSnapshot::default()
            }
        }
    }

    async fn try_daily_candles(&self, symbol: &str, limit: u32) -> Result<Vec<Candle>, RadarError> {
        let response = self
            .client
            .get(&self.spot_url)
            .query(&[
                ("symbol", symbol),
                ("interval", "1d"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RadarError::Api(format!("HTTP {}", response.status())));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        parse_kline_rows(&rows)
    }

    async fn try_funding_rate(&self, symbol: &str) -> Result<f64, RadarError> {
        let response = self
            .client
            .get(&self.futures_url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RadarError::Api(format!("HTTP {}", response.status())));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        Ok(funding_from_payload(&payload, symbol).unwrap_or(0.0))
    }

    async fn try_fear_greed(&self) -> Result<u32, RadarError> {
        let response = self
            .client
            .get(&self.fng_url)
            .send()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RadarError::Api(format!("HTTP {}", response.status())));
        }

        let payload: FngResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        payload
            .data
            .first()
            .and_then(|entry| entry.value.parse().ok())
            .ok_or_else(|| RadarError::InvalidData("empty fear & greed payload".to_string()))
    }

    async fn try_global_snapshot(&self) -> Result<GlobalSnapshot, RadarError> {
        let response = self
            .client
            .get(&self.global_url)
            .send()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RadarError::Api(format!("HTTP {}", response.status())));
        }

        let payload: GlobalResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Api(e.to_string()))?;

        Ok(GlobalSnapshot {
            market_cap_change_24h: payload.data.market_cap_change_percentage_24h_usd,
            btc_dominance: payload
                .data
                .market_cap_percentage
                .as_ref()
                .and_then(|p| p.btc),
        })
    }
}

impl Default for MarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Deserialize)]
struct FngEntry {
    value: String,
}

#[derive(Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Deserialize)]
struct GlobalData {
    market_cap_change_percentage_24h_usd: Option<f64>,
    market_cap_percentage: Option<MarketCapPercentage>,
}

#[derive(Deserialize)]
struct MarketCapPercentage {
    btc: Option<f64>,
}

/// Parse Binance kline rows: heterogeneous arrays of
/// [open_time_ms, "open", "high", "low", "close", "volume", ...].
fn parse_kline_rows(rows: &[Value]) -> Result<Vec<Candle>, RadarError> {
    rows.iter()
        .map(|row| {
            candle_from_row(row).ok_or_else(|| {
                RadarError::InvalidData(format!("malformed kline row: {}", row))
            })
        })
        .collect()
}

fn candle_from_row(row: &Value) -> Option<Candle> {
    let open_time = DateTime::from_timestamp_millis(row.get(0)?.as_i64()?)?;

    Some(Candle {
        open_time,
        open: number_at(row, 1)?,
        high: number_at(row, 2)?,
        low: number_at(row, 3)?,
        close: number_at(row, 4)?,
        volume: number_at(row, 5)?,
    })
}

/// Binance serializes prices as strings; tolerate bare numbers too.
fn number_at(row: &Value, index: usize) -> Option<f64> {
    let value = row.get(index)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Funding rate from a premium-index payload. The endpoint usually answers
/// with a single object, but occasionally with a list of per-symbol objects.
fn funding_from_payload(payload: &Value, symbol: &str) -> Option<f64> {
    if payload.get("lastFundingRate").is_some() {
        return payload.get("lastFundingRate").and_then(rate_value);
    }

    payload
        .as_array()?
        .iter()
        .find(|item| item.get("symbol").and_then(Value::as_str) == Some(symbol))
        .and_then(|item| item.get("lastFundingRate"))
        .and_then(rate_value)
}

fn rate_value(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline_rows() {
        let rows = vec![json!([
            1709251200000i64,
            "62000.00",
            "63500.00",
            "61000.00",
            "63000.00",
            "12345.678",
            1709337599999i64,
            "770000000.0",
            100000,
            "6000.0",
            "380000000.0",
            "0"
        ])];

        let candles = parse_kline_rows(&rows).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 62000.0);
        assert_eq!(candles[0].high, 63500.0);
        assert_eq!(candles[0].low, 61000.0);
        assert_eq!(candles[0].close, 63000.0);
        assert_eq!(candles[0].volume, 12345.678);
    }

    #[test]
    fn test_parse_kline_rejects_malformed_row() {
        let rows = vec![json!(["not-a-timestamp", "1", "2", "3", "4", "5"])];
        assert!(parse_kline_rows(&rows).is_err());
    }

    #[test]
    fn test_funding_from_object_payload() {
        let payload = json!({
            "symbol": "BTCUSDT",
            "markPrice": "63000.00",
            "lastFundingRate": "0.00010000",
            "nextFundingTime": 1709280000000i64
        });

        assert_eq!(funding_from_payload(&payload, "BTCUSDT"), Some(0.0001));
    }

    #[test]
    fn test_funding_from_list_payload() {
        let payload = json!([
            {"symbol": "ETHUSDT", "lastFundingRate": "0.00050000"},
            {"symbol": "BTCUSDT", "lastFundingRate": "-0.00020000"}
        ]);

        assert_eq!(funding_from_payload(&payload, "BTCUSDT"), Some(-0.0002));
    }

    #[test]
    fn test_funding_from_unexpected_payload_is_none() {
        let payload = json!({"code": -1121, "msg": "Invalid symbol."});
        assert_eq!(funding_from_payload(&payload, "BTCUSDT"), None);
    }

    #[test]
    fn test_fng_payload_parses_string_value() {
        let payload: FngResponse = serde_json::from_value(json!({
            "name": "Fear and Greed Index",
            "data": [{"value": "54", "value_classification": "Neutral", "timestamp": "1709251200"}]
        }))
        .unwrap();

        let value: u32 = payload.data[0].value.parse().unwrap();
        assert_eq!(value, 54);
    }

    #[test]
    fn test_global_payload_with_missing_fields() {
        let payload: GlobalResponse = serde_json::from_value(json!({
            "data": {"active_cryptocurrencies": 10000}
        }))
        .unwrap();

        assert_eq!(payload.data.market_cap_change_percentage_24h_usd, None);
        assert!(payload.data.market_cap_percentage.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoints_degrade_to_neutral() {
        // Discard port on loopback: refused immediately, no real traffic
        let client = MarketDataClient::with_endpoints(
            "http://127.0.0.1:9/klines",
            "http://127.0.0.1:9/premiumIndex",
            "http://127.0.0.1:9/fng",
            "http://127.0.0.1:9/global",
        );

        assert!(client.daily_candles("BTCUSDT", 60).await.is_empty());
        assert_eq!(client.funding_rate("BTCUSDT").await, 0.0);
        assert_eq!(client.fear_greed().await, 50);
        assert_eq!(client.global_snapshot().await, GlobalSnapshot::default());
    }
}
