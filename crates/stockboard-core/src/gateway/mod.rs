//! Remote data gateway contract and its error shape.
//!
//! | Operation | Key | Result |
//! |-----------|-----|--------|
//! | [`fetch_overview`](MarketGateway::fetch_overview) | [`FetchKey::Overview`] | [`OverviewRecord`] |
//! | [`fetch_time_series`](MarketGateway::fetch_time_series) | [`FetchKey::TimeSeries`] | [`TimeSeriesRecord`] |
//! | [`invalidate`](MarketGateway::invalidate) | either | drops the freshness entry |
//!
//! Transport failures come back as `Err(FetchError)` with kind
//! [`FetchErrorKind::NetworkFailure`]. Well-formed responses that carry no
//! usable data (rate limit notes, premium notices, empty objects) come back as
//! `Ok(Fetched::Limited(..))` so callers can tell "the call failed" from "the
//! call answered, but not with data".

mod alphavantage;
mod single_flight;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CacheMode, OverviewRecord, Symbol, TimeRange, TimeSeriesRecord};

pub use alphavantage::AlphaVantageGateway;

/// Classification of a failed or degraded fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Standard-tier quota exhausted.
    RateLimited,
    /// Endpoint needs elevated access, or the API key is missing/invalid.
    PremiumRequired,
    /// Transport, DNS, timeout or unreadable response.
    NetworkFailure,
    /// Well-formed response without usable data.
    Empty,
}

impl FetchErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::PremiumRequired => "premium_required",
            Self::NetworkFailure => "network_failure",
            Self::Empty => "empty",
        }
    }
}

impl Display for FetchErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error value shown by every view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, message)
    }

    pub fn premium_required(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::PremiumRequired, message)
    }

    pub fn network_failure(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NetworkFailure, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Empty, message)
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the upstream text points at a premium restriction.
    pub fn needs_premium_hint(&self) -> bool {
        self.kind == FetchErrorKind::PremiumRequired
            || self.message.to_ascii_lowercase().contains("premium")
    }

    /// Recovery hint shown under the error message.
    pub fn hint(&self) -> Option<&'static str> {
        if self.needs_premium_hint() {
            return Some(
                "This endpoint requires a premium Alpha Vantage API key. Toggle demo data to explore the dashboard.",
            );
        }
        match self.kind {
            FetchErrorKind::RateLimited => Some(
                "You may have reached the standard API limit of 25 requests per day. Toggle demo data or try again later.",
            ),
            FetchErrorKind::NetworkFailure | FetchErrorKind::Empty => None,
            FetchErrorKind::PremiumRequired => None,
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for FetchError {}

/// Answer of a gateway call that reached the upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    /// The upstream answered with a degraded payload instead of data.
    Limited(FetchError),
}

impl<T> Fetched<T> {
    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            Self::Data(data) => Ok(data),
            Self::Limited(error) => Err(error),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Limited(_) => None,
        }
    }

    pub fn limited(&self) -> Option<&FetchError> {
        match self {
            Self::Data(_) => None,
            Self::Limited(error) => Some(error),
        }
    }
}

/// Identity of a gateway request, used for caching, de-duplication and
/// invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum FetchKey {
    Overview { symbol: Symbol },
    TimeSeries { symbol: Symbol, range: TimeRange },
}

impl FetchKey {
    pub fn overview(symbol: Symbol) -> Self {
        Self::Overview { symbol }
    }

    pub fn time_series(symbol: Symbol, range: TimeRange) -> Self {
        Self::TimeSeries { symbol, range }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Overview { symbol } | Self::TimeSeries { symbol, .. } => symbol,
        }
    }
}

impl Display for FetchKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overview { symbol } => write!(f, "overview:{symbol}"),
            Self::TimeSeries { symbol, range } => write!(f, "series:{symbol}:{range}"),
        }
    }
}

/// Outcome of one gateway call.
pub type FetchOutcome<T> = Result<Fetched<T>, FetchError>;

/// Boxed future returned by [`MarketGateway`] methods.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote data gateway contract.
///
/// Implementations serve fresh cached results under [`CacheMode::Use`] and
/// share one upstream request between concurrent calls for the same key.
pub trait MarketGateway: Send + Sync {
    fn fetch_overview<'a>(
        &'a self,
        symbol: Symbol,
        mode: CacheMode,
    ) -> GatewayFuture<'a, FetchOutcome<OverviewRecord>>;

    /// Fetch the raw series for `symbol`; `range` only selects the cache key.
    fn fetch_time_series<'a>(
        &'a self,
        symbol: Symbol,
        range: TimeRange,
        mode: CacheMode,
    ) -> GatewayFuture<'a, FetchOutcome<TimeSeriesRecord>>;

    /// Drop the freshness entry for `key` so the next fetch goes upstream.
    fn invalidate<'a>(&'a self, key: &'a FetchKey) -> GatewayFuture<'a, ()>;
}
