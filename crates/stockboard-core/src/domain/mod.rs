//! # Domain Models
//!
//! Typed records shared by the gateway, the reconciler and presentation.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker, optionally checked against the watch list |
//! | [`TimeRange`] | Chart window (1 week, 1 month, 3 months) |
//! | [`MarketTimestamp`] | Exchange-local wall-clock sample time |
//! | [`OverviewRecord`] | Flat company fundamentals map |
//! | [`TimeSeriesPoint`] | One OHLCV sample |
//! | [`TimeSeriesRecord`] | Samples for a symbol/interval |
//! | [`SeriesStats`] | Latest close, highest high, lowest low |

mod overview;
mod series;
mod symbol;
mod time_range;
mod timestamp;

pub use overview::{field, OverviewRecord};
pub use series::{SeriesStats, TimeSeriesPoint, TimeSeriesRecord};
pub use symbol::{Symbol, WATCH_LIST};
pub use time_range::TimeRange;
pub use timestamp::MarketTimestamp;
