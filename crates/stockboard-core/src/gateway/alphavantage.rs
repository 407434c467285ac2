use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::single_flight::InFlight;
use super::{FetchError, FetchKey, FetchOutcome, Fetched, GatewayFuture, MarketGateway};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::throttling::RequestBudget;
use crate::{
    CacheMode, CacheStore, GatewayConfig, MarketTimestamp, OverviewRecord, Symbol, TimeRange,
    TimeSeriesPoint, TimeSeriesRecord,
};

const API_KEY_PARAM: &str = "apikey";

/// Gateway backed by the Alpha Vantage query endpoint.
pub struct AlphaVantageGateway {
    http_client: Arc<dyn HttpClient>,
    config: GatewayConfig,
    budget: RequestBudget,
    overviews: CacheStore<FetchKey, OverviewRecord>,
    series: CacheStore<FetchKey, TimeSeriesRecord>,
    overview_calls: InFlight<FetchKey, OverviewRecord>,
    series_calls: InFlight<FetchKey, TimeSeriesRecord>,
}

impl AlphaVantageGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: GatewayConfig) -> Self {
        let budget = RequestBudget::new(Duration::from_secs(60), config.requests_per_minute);
        Self {
            http_client,
            budget,
            overviews: CacheStore::new(config.freshness_window),
            series: CacheStore::new(config.freshness_window),
            overview_calls: InFlight::new(),
            series_calls: InFlight::new(),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn overview(&self, symbol: Symbol, mode: CacheMode) -> FetchOutcome<OverviewRecord> {
        let key = FetchKey::overview(symbol.clone());
        if mode == CacheMode::Use {
            if let Some(record) = self.overviews.get(&key).await {
                debug!(%key, "served from cache");
                return Ok(Fetched::Data(record));
            }
        }

        self.overview_calls
            .run(key.clone(), || self.load_overview(key, symbol))
            .await
    }

    async fn load_overview(&self, key: FetchKey, symbol: Symbol) -> FetchOutcome<OverviewRecord> {
        let request = HttpRequest::get(&self.config.base_url)
            .with_query("function", "OVERVIEW")
            .with_query("symbol", symbol.as_str());

        let payload = match self.send(&key, request).await? {
            Fetched::Data(payload) => payload,
            Fetched::Limited(error) => return Ok(Fetched::Limited(error)),
        };

        if payload.is_empty() {
            return Ok(limited(
                &key,
                FetchError::empty(format!("no overview data returned for {symbol}")),
            ));
        }

        let record = OverviewRecord::from_json_object(&payload);
        self.overviews.put(key, record.clone()).await;
        Ok(Fetched::Data(record))
    }

    async fn time_series(
        &self,
        symbol: Symbol,
        range: TimeRange,
        mode: CacheMode,
    ) -> FetchOutcome<TimeSeriesRecord> {
        let key = FetchKey::time_series(symbol.clone(), range);
        if mode == CacheMode::Use {
            if let Some(record) = self.series.get(&key).await {
                debug!(%key, "served from cache");
                return Ok(Fetched::Data(record));
            }
        }

        self.series_calls
            .run(key.clone(), || self.load_time_series(key, symbol))
            .await
    }

    async fn load_time_series(
        &self,
        key: FetchKey,
        symbol: Symbol,
    ) -> FetchOutcome<TimeSeriesRecord> {
        let series = &self.config.series;
        let request = HttpRequest::get(&self.config.base_url)
            .with_query("function", series.function.as_str())
            .with_query("symbol", symbol.as_str())
            .with_query("interval", series.interval.as_str())
            .with_query("outputsize", series.output_size.as_str());

        let payload = match self.send(&key, request).await? {
            Fetched::Data(payload) => payload,
            Fetched::Limited(error) => return Ok(Fetched::Limited(error)),
        };

        let Some(record) = decode_series(&symbol, &series.interval, &payload) else {
            return Ok(limited(
                &key,
                FetchError::empty(format!("no time series data returned for {symbol}")),
            ));
        };

        self.series.put(key, record.clone()).await;
        Ok(Fetched::Data(record))
    }

    /// Issue one upstream call and classify the answer. Budget and credential
    /// checks happen before any network traffic.
    async fn send(&self, key: &FetchKey, request: HttpRequest) -> FetchOutcome<Map<String, Value>> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Ok(limited(
                key,
                FetchError::premium_required("Alpha Vantage API key is not configured"),
            ));
        };

        if let Err(delay) = self.budget.acquire() {
            return Ok(limited(
                key,
                FetchError::rate_limited(format!(
                    "client request budget exhausted; retry in {:.2}s",
                    delay.as_secs_f64()
                )),
            ));
        }

        let request = request
            .with_query(API_KEY_PARAM, api_key)
            .with_timeout_ms(self.config.timeout_ms);
        debug!(%key, url = %request.redacted_url(API_KEY_PARAM), "requesting alphavantage");

        let response = self.http_client.execute(request).await.map_err(|error| {
            warn!(%key, error = %error, timed_out = error.timed_out(), "alphavantage transport error");
            FetchError::network_failure(format!("alphavantage transport error: {}", error.message()))
        })?;

        match read_payload(response) {
            Ok(Fetched::Limited(error)) => Ok(limited(key, error)),
            Err(error) => {
                warn!(%key, error = %error, "alphavantage response rejected");
                Err(error)
            }
            outcome => outcome,
        }
    }
}

impl MarketGateway for AlphaVantageGateway {
    fn fetch_overview<'a>(
        &'a self,
        symbol: Symbol,
        mode: CacheMode,
    ) -> GatewayFuture<'a, FetchOutcome<OverviewRecord>> {
        Box::pin(self.overview(symbol, mode))
    }

    fn fetch_time_series<'a>(
        &'a self,
        symbol: Symbol,
        range: TimeRange,
        mode: CacheMode,
    ) -> GatewayFuture<'a, FetchOutcome<TimeSeriesRecord>> {
        Box::pin(self.time_series(symbol, range, mode))
    }

    fn invalidate<'a>(&'a self, key: &'a FetchKey) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let removed = match key {
                FetchKey::Overview { .. } => self.overviews.invalidate(key).await,
                FetchKey::TimeSeries { .. } => self.series.invalidate(key).await,
            };
            debug!(%key, removed, "invalidated");
        })
    }
}

fn limited<T>(key: &FetchKey, error: FetchError) -> Fetched<T> {
    warn!(%key, kind = %error.kind(), message = error.message(), "degraded alphavantage payload");
    Fetched::Limited(error)
}

/// Classify a transport response into a JSON object, a degraded payload or a
/// hard failure.
fn read_payload(response: HttpResponse) -> FetchOutcome<Map<String, Value>> {
    if response.status == 429 {
        return Ok(Fetched::Limited(FetchError::rate_limited(
            "alphavantage returned status 429",
        )));
    }
    if !response.is_success() {
        return Err(FetchError::network_failure(format!(
            "alphavantage returned status {}",
            response.status
        )));
    }

    let payload = match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(payload)) => payload,
        Ok(_) => {
            return Err(FetchError::network_failure(
                "malformed alphavantage response: expected a JSON object",
            ))
        }
        Err(error) => {
            return Err(FetchError::network_failure(format!(
                "malformed alphavantage response: {error}"
            )))
        }
    };

    if let Some(error) = notice_error(&payload) {
        return Ok(Fetched::Limited(error));
    }

    Ok(Fetched::Data(payload))
}

fn notice_error(payload: &Map<String, Value>) -> Option<FetchError> {
    if let Some(note) = payload.get("Note") {
        return Some(classify_notice(Notice::Note, &text_of(note)));
    }
    if let Some(information) = payload.get("Information") {
        return Some(classify_notice(Notice::Information, &text_of(information)));
    }
    payload.get("Error Message").map(|message| {
        let text = text_of(message);
        if text.to_ascii_lowercase().contains(API_KEY_PARAM) {
            FetchError::premium_required(text)
        } else {
            FetchError::empty(text)
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    Note,
    Information,
}

const QUOTA_MARKERS: [&str; 4] = ["rate limit", "call frequency", "requests per", "calls per"];

fn classify_notice(notice: Notice, text: &str) -> FetchError {
    let lower = text.to_ascii_lowercase();
    if QUOTA_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return FetchError::rate_limited(text);
    }
    if lower.contains("premium") {
        return FetchError::premium_required(text);
    }
    match notice {
        Notice::Note => FetchError::rate_limited(text),
        Notice::Information => FetchError::premium_required(text),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Decode the `Time Series …` section. Returns `None` when the section is
/// missing or holds no valid point.
fn decode_series(
    symbol: &Symbol,
    default_interval: &str,
    payload: &Map<String, Value>,
) -> Option<TimeSeriesRecord> {
    let section = payload
        .iter()
        .find(|(name, _)| name.starts_with("Time Series"))
        .and_then(|(_, value)| value.as_object())?;

    let interval = payload
        .get("Meta Data")
        .and_then(Value::as_object)
        .and_then(|meta| meta.get("4. Interval").or_else(|| meta.get("Interval")))
        .and_then(Value::as_str)
        .unwrap_or(default_interval);

    let mut skipped = 0_usize;
    let points = section
        .iter()
        .filter_map(|(timestamp, bar)| {
            let point = decode_point(timestamp, bar);
            if point.is_none() {
                skipped += 1;
            }
            point
        })
        .collect::<Vec<_>>();

    if skipped > 0 {
        debug!(%symbol, skipped, "skipped unreadable series points");
    }
    if points.is_empty() {
        return None;
    }

    let mut record = TimeSeriesRecord::new(symbol.clone(), interval, points);
    record.sort_ascending();
    Some(record)
}

fn decode_point(timestamp: &str, bar: &Value) -> Option<TimeSeriesPoint> {
    let timestamp = MarketTimestamp::parse(timestamp).ok()?;
    let bar = RawBar::deserialize(bar).ok()?;
    TimeSeriesPoint::new(timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume).ok()
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "1. open", alias = "open", deserialize_with = "number")]
    open: f64,
    #[serde(rename = "2. high", alias = "high", deserialize_with = "number")]
    high: f64,
    #[serde(rename = "3. low", alias = "low", deserialize_with = "number")]
    low: f64,
    #[serde(rename = "4. close", alias = "close", deserialize_with = "number")]
    close: f64,
    #[serde(
        rename = "5. volume",
        alias = "6. volume",
        alias = "volume",
        default,
        deserialize_with = "volume"
    )]
    volume: u64,
}

/// Alpha Vantage quotes numbers as strings; accept either spelling.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn volume<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = number(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom("volume must be a non-negative number"));
    }
    Ok(value.round() as u64)
}
