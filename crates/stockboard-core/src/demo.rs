//! Fixed demo records shown while demo data is toggled on, or when no symbol
//! is selected.

use crate::domain::field;
use crate::{
    MarketTimestamp, OverviewRecord, SeriesWindows, Symbol, TimeRange, TimeSeriesPoint,
    TimeSeriesRecord,
};

const DEMO_DESCRIPTION: &str = "This is sample data shown because the API's standard 25 requests/day limit has been reached. The sample data demonstrates the dashboard without making actual API calls.";

/// Demo overview. `Symbol` and `Name` echo the selected symbol; everything
/// else is fixed sample data.
pub fn overview_record(symbol: Option<&Symbol>) -> OverviewRecord {
    let (ticker, name) = match symbol {
        Some(symbol) => (symbol.as_str(), symbol.as_str()),
        None => ("AAPL", "Apple Inc."),
    };

    OverviewRecord::from_fields([
        (field::SYMBOL, ticker),
        (field::NAME, name),
        (field::DESCRIPTION, DEMO_DESCRIPTION),
        (field::SECTOR, "Technology"),
        (field::INDUSTRY, "Consumer Electronics"),
        (field::EXCHANGE, "NASDAQ"),
        (field::COUNTRY, "USA"),
        (field::MARKET_CAPITALIZATION, "2500000000"),
        (field::SHARES_OUTSTANDING, "17000000"),
        (field::EPS, "6.35"),
        (field::PE_RATIO, "28.5"),
        (field::WEEK_52_HIGH, "198.23"),
        (field::WEEK_52_LOW, "124.17"),
        (field::LATEST_QUARTER, "2025-03-31"),
        (field::BETA, "1.28"),
        (field::DIVIDEND_YIELD, "0.005"),
        (field::DIVIDEND_PER_SHARE, "0.92"),
        (field::REVENUE_TTM, "394328000000"),
        (field::REVENUE_PER_SHARE_TTM, "23.20"),
        (field::PROFIT_MARGIN, "0.22"),
        (field::EBITDA, "125000000000"),
        (field::RETURN_ON_EQUITY_TTM, "0.315"),
        (field::RETURN_ON_ASSETS_TTM, "0.195"),
        (field::OPERATING_MARGIN_TTM, "0.292"),
        (field::QUARTERLY_EARNINGS_GROWTH_YOY, "0.08"),
        (field::QUARTERLY_REVENUE_GROWTH_YOY, "0.042"),
        (field::TRAILING_PE, "28.5"),
        (field::FORWARD_PE, "25.8"),
        (field::PRICE_TO_SALES_RATIO_TTM, "6.84"),
        (field::PRICE_TO_BOOK_RATIO, "32.75"),
        (field::PEG_RATIO, "2.84"),
        (field::ANALYST_RATING_STRONG_BUY, "15"),
        (field::ANALYST_RATING_BUY, "22"),
        (field::ANALYST_RATING_HOLD, "8"),
        (field::ANALYST_RATING_SELL, "2"),
        (field::ANALYST_RATING_STRONG_SELL, "0"),
        (field::ANALYST_TARGET_PRICE, "215.00"),
        ("FiscalYearEnd", "September"),
        ("OfficialSite", "https://www.apple.com"),
    ])
}

// timestamp, open, high, low, close, volume
const SAMPLE_BARS: [(&str, f64, f64, f64, f64, u64); 12] = [
    ("2025-05-09 19:55:00", 198.56, 198.58, 198.51, 198.58, 2_904),
    ("2025-05-09 19:50:00", 198.53, 198.59, 198.51, 198.56, 3_588),
    ("2025-05-09 19:45:00", 198.49, 198.55, 198.46, 198.53, 2_175),
    ("2025-05-09 19:40:00", 198.44, 198.50, 198.40, 198.49, 1_962),
    ("2025-05-09 19:35:00", 198.47, 198.49, 198.41, 198.44, 2_410),
    ("2025-05-09 19:30:00", 198.52, 198.54, 198.45, 198.47, 3_021),
    ("2025-05-09 19:25:00", 198.50, 198.56, 198.48, 198.52, 1_744),
    ("2025-05-09 19:20:00", 198.41, 198.52, 198.40, 198.50, 2_688),
    ("2025-05-09 19:15:00", 198.38, 198.44, 198.35, 198.41, 1_530),
    ("2025-05-09 19:10:00", 198.33, 198.40, 198.30, 198.38, 2_097),
    ("2025-05-09 19:05:00", 198.36, 198.39, 198.28, 198.33, 2_352),
    ("2025-05-09 19:00:00", 198.30, 198.38, 198.27, 198.36, 4_118),
];

/// Hardcoded AAPL 5-minute sample, sorted and windowed for `range`.
pub fn sample_series(range: TimeRange, windows: &SeriesWindows) -> TimeSeriesRecord {
    let points = SAMPLE_BARS
        .iter()
        .filter_map(|&(timestamp, open, high, low, close, volume)| {
            let timestamp = MarketTimestamp::parse(timestamp).ok()?;
            TimeSeriesPoint::new(timestamp, open, high, low, close, volume).ok()
        })
        .collect();

    let mut record = TimeSeriesRecord::new(Symbol::initial(), "5min", points);
    record.sort_ascending();
    record.retain_latest(windows.window(range));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_overview_echoes_selected_symbol() {
        let symbol = Symbol::parse("MSFT").expect("symbol");
        let record = overview_record(Some(&symbol));
        assert_eq!(record.symbol(), Some("MSFT"));
        assert_eq!(record.name(), Some("MSFT"));
        assert_eq!(record.get(field::MARKET_CAPITALIZATION), Some("2500000000"));

        let fallback = overview_record(None);
        assert_eq!(fallback.symbol(), Some("AAPL"));
        assert_eq!(fallback.name(), Some("Apple Inc."));
    }

    #[test]
    fn sample_series_is_sorted_and_complete() {
        let record = sample_series(TimeRange::ThreeMonths, &SeriesWindows::default());
        assert_eq!(record.len(), SAMPLE_BARS.len());
        assert!(record
            .points
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp));
        assert_eq!(record.stats().latest, 198.58);
    }

    #[test]
    fn sample_series_respects_small_windows() {
        let windows = SeriesWindows {
            one_week: 3,
            one_month: 6,
        };
        assert_eq!(sample_series(TimeRange::OneWeek, &windows).len(), 3);
        assert_eq!(sample_series(TimeRange::OneMonth, &windows).len(), 6);
    }
}
