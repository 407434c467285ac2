use serde::{Deserialize, Serialize};

use crate::{MarketTimestamp, Symbol, ValidationError};

/// One OHLCV sample of a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: MarketTimestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl TimeSeriesPoint {
    pub fn new(
        timestamp: MarketTimestamp,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Price samples for one symbol at one sampling interval.
///
/// Point order is whatever the producer used; call [`sort_ascending`] before
/// display.
///
/// [`sort_ascending`]: TimeSeriesRecord::sort_ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub symbol: Symbol,
    pub interval: String,
    pub points: Vec<TimeSeriesPoint>,
}

impl TimeSeriesRecord {
    pub fn new(symbol: Symbol, interval: impl Into<String>, points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            symbol,
            interval: interval.into(),
            points,
        }
    }

    pub fn empty(symbol: Symbol, interval: impl Into<String>) -> Self {
        Self::new(symbol, interval, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn sort_ascending(&mut self) {
        self.points.sort_by_key(|point| point.timestamp);
    }

    /// Keep only the `window` most recent points; `None` keeps everything.
    /// Assumes the points are already sorted ascending.
    pub fn retain_latest(&mut self, window: Option<usize>) {
        if let Some(window) = window {
            let excess = self.points.len().saturating_sub(window);
            self.points.drain(..excess);
        }
    }

    pub fn stats(&self) -> SeriesStats {
        SeriesStats::from_points(&self.points)
    }
}

/// Headline numbers shown next to the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Close of the last point in sequence order.
    pub latest: f64,
    pub highest: f64,
    pub lowest: f64,
}

impl SeriesStats {
    pub fn from_points(points: &[TimeSeriesPoint]) -> Self {
        let Some(last) = points.last() else {
            return Self::default();
        };

        let highest = points
            .iter()
            .map(|point| point.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let lowest = points
            .iter()
            .map(|point| point.low)
            .fold(f64::INFINITY, f64::min);

        Self {
            latest: last.close,
            highest,
            lowest,
        }
    }
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
