//! Process configuration for the gateway and the dashboard.
//!
//! Settings come from environment variables with built-in defaults; the CLI
//! layers its flags on top.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `STOCKBOARD_ALPHAVANTAGE_API_KEY` | unset (every fetch reports a premium/key error) |
//! | `STOCKBOARD_ALPHAVANTAGE_API_URL` | `https://www.alphavantage.co/query` |
//! | `STOCKBOARD_TIMEOUT_MS` | `5000` |
//! | `STOCKBOARD_REQUESTS_PER_MINUTE` | `5` (`0` disables the client budget) |

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use crate::{ConfigError, TimeRange};

pub const API_KEY_ENV: &str = "STOCKBOARD_ALPHAVANTAGE_API_KEY";
pub const API_URL_ENV: &str = "STOCKBOARD_ALPHAVANTAGE_API_URL";
pub const TIMEOUT_ENV: &str = "STOCKBOARD_TIMEOUT_MS";
pub const REQUESTS_PER_MINUTE_ENV: &str = "STOCKBOARD_REQUESTS_PER_MINUTE";

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Upstream request shape for the price series. Every [`TimeRange`] uses the
/// same request; ranges only differ in client-side windowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub function: String,
    pub interval: String,
    pub output_size: String,
}

impl Default for SeriesRequest {
    fn default() -> Self {
        Self {
            function: String::from("TIME_SERIES_INTRADAY"),
            interval: String::from("5min"),
            output_size: String::from("full"),
        }
    }
}

/// Gateway settings.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub freshness_window: Duration,
    pub requests_per_minute: u32,
    pub series: SeriesRequest,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key: None,
            timeout_ms: 5_000,
            freshness_window: Duration::from_secs(300),
            requests_per_minute: 5,
            series: SeriesRequest::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        config.api_key = read(API_KEY_ENV);
        if let Some(base_url) = read(API_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(raw) = read(TIMEOUT_ENV) {
            config.timeout_ms = match raw.parse::<u64>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: TIMEOUT_ENV,
                        expected: "a positive integer of milliseconds",
                        value: raw,
                    })
                }
            };
        }
        if let Some(raw) = read(REQUESTS_PER_MINUTE_ENV) {
            config.requests_per_minute =
                raw.parse::<u32>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: REQUESTS_PER_MINUTE_ENV,
                        expected: "a non-negative integer",
                        value: raw.clone(),
                    })?;
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_freshness_window(mut self, freshness_window: Duration) -> Self {
        self.freshness_window = freshness_window;
        self
    }

    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }
}

impl Debug for GatewayConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .field("freshness_window", &self.freshness_window)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("series", &self.series)
            .finish()
    }
}

/// How many of the most recent samples each range keeps.
///
/// The defaults assume 5-minute samples over an 8-hour trading day:
/// 5 days x 96 = 480 and 20 days x 96 = 1920. A different upstream
/// granularity needs different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesWindows {
    pub one_week: usize,
    pub one_month: usize,
}

impl Default for SeriesWindows {
    fn default() -> Self {
        Self {
            one_week: 480,
            one_month: 1_920,
        }
    }
}

impl SeriesWindows {
    /// `None` keeps the whole series.
    pub const fn window(&self, range: TimeRange) -> Option<usize> {
        match range {
            TimeRange::OneWeek => Some(self.one_week),
            TimeRange::OneMonth => Some(self.one_month),
            TimeRange::ThreeMonths => None,
        }
    }
}

/// Dashboard behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Period of the chart auto-refresh tick.
    pub auto_refresh: Duration,
    pub windows: SeriesWindows,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            auto_refresh: Duration::from_secs(30),
            windows: SeriesWindows::default(),
        }
    }
}
