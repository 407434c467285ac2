//! Display formatting for overview fields and chart values.

use serde::Serialize;

use crate::domain::field;
use crate::OverviewRecord;

/// Integer part of `value`, grouped by thousands. No rounding.
///
/// ```
/// use stockboard_core::format::format_large_number;
///
/// assert_eq!(format_large_number(Some("2500000000")), "2,500,000,000");
/// assert_eq!(format_large_number(Some("1234.99")), "1,234");
/// assert_eq!(format_large_number(None), "0");
/// ```
pub fn format_large_number(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim) else {
        return String::from("0");
    };

    let (negative, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let digits = unsigned
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return String::from("0");
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Ratio rendered as a percentage with two decimals.
pub fn format_percentage(value: Option<&str>) -> String {
    match parse_number(value) {
        Some(ratio) => format!("{:.2}%", ratio * 100.0),
        None => String::from("0%"),
    }
}

pub fn format_currency(value: Option<&str>) -> String {
    format_price(parse_number(value).unwrap_or(0.0))
}

pub fn format_price(value: f64) -> String {
    format!("${value:.2}")
}

/// Sign of a value, used to colour it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Positive,
    Negative,
    Neutral,
}

pub fn trend(value: Option<&str>) -> Trend {
    match parse_number(value) {
        Some(number) if number >= 0.0 => Trend::Positive,
        Some(_) => Trend::Negative,
        None => Trend::Neutral,
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|number| number.is_finite())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalystRatings {
    pub strong_buy: String,
    pub buy: String,
    pub hold: String,
    pub sell: String,
    pub strong_sell: String,
}

/// A percentage together with its sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedPercentage {
    pub value: String,
    pub trend: Trend,
}

impl SignedPercentage {
    fn from_ratio(value: Option<&str>) -> Self {
        Self {
            value: format_percentage(value),
            trend: trend(value),
        }
    }
}

/// Profitability and growth ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMetrics {
    pub return_on_equity: SignedPercentage,
    pub return_on_assets: SignedPercentage,
    pub operating_margin: SignedPercentage,
    pub quarterly_earnings_growth: SignedPercentage,
    pub quarterly_revenue_growth: SignedPercentage,
}

/// Price multiples, shown as the upstream reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuationMetrics {
    pub trailing_pe: String,
    pub forward_pe: String,
    pub price_to_sales: String,
    pub price_to_book: String,
    pub peg_ratio: String,
}

/// Presentation-ready company overview.
///
/// Missing text fields read `N/A`; missing numbers read as their zero value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewSummary {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub country: String,
    pub sector: String,
    pub industry: String,
    pub description: String,
    pub market_cap: String,
    pub shares_outstanding: String,
    pub eps: String,
    pub pe_ratio: String,
    pub week_52_high: String,
    pub week_52_low: String,
    pub latest_quarter: String,
    pub beta: String,
    pub dividend_yield: String,
    pub dividend_per_share: String,
    pub revenue_ttm: String,
    pub revenue_per_share_ttm: String,
    pub profit_margin: String,
    pub profit_margin_trend: Trend,
    pub ebitda: String,
    pub analyst_target_price: String,
    pub analyst_ratings: AnalystRatings,
    pub key_metrics: KeyMetrics,
    pub valuation: ValuationMetrics,
}

impl OverviewSummary {
    pub fn from_record(record: &OverviewRecord) -> Self {
        let text = |name: &str| record.get(name).unwrap_or("N/A").to_owned();
        let count = |name: &str| format_large_number(record.get(name));
        let ratio = |name: &str| record.get(name).unwrap_or("0").to_owned();
        let percentage = |name: &str| SignedPercentage::from_ratio(record.get(name));

        Self {
            symbol: text(field::SYMBOL),
            name: text(field::NAME),
            exchange: text(field::EXCHANGE),
            country: text(field::COUNTRY),
            sector: text(field::SECTOR),
            industry: text(field::INDUSTRY),
            description: text(field::DESCRIPTION),
            market_cap: format!("${}", count(field::MARKET_CAPITALIZATION)),
            shares_outstanding: count(field::SHARES_OUTSTANDING),
            eps: format_currency(record.get(field::EPS)),
            pe_ratio: ratio(field::PE_RATIO),
            week_52_high: format_currency(record.get(field::WEEK_52_HIGH)),
            week_52_low: format_currency(record.get(field::WEEK_52_LOW)),
            latest_quarter: text(field::LATEST_QUARTER),
            beta: ratio(field::BETA),
            dividend_yield: format_percentage(record.get(field::DIVIDEND_YIELD)),
            dividend_per_share: format_currency(record.get(field::DIVIDEND_PER_SHARE)),
            revenue_ttm: format!("${}", count(field::REVENUE_TTM)),
            revenue_per_share_ttm: format_currency(record.get(field::REVENUE_PER_SHARE_TTM)),
            profit_margin: format_percentage(record.get(field::PROFIT_MARGIN)),
            profit_margin_trend: trend(record.get(field::PROFIT_MARGIN)),
            ebitda: format!("${}", count(field::EBITDA)),
            analyst_target_price: format_currency(record.get(field::ANALYST_TARGET_PRICE)),
            analyst_ratings: AnalystRatings {
                strong_buy: count(field::ANALYST_RATING_STRONG_BUY),
                buy: count(field::ANALYST_RATING_BUY),
                hold: count(field::ANALYST_RATING_HOLD),
                sell: count(field::ANALYST_RATING_SELL),
                strong_sell: count(field::ANALYST_RATING_STRONG_SELL),
            },
            key_metrics: KeyMetrics {
                return_on_equity: percentage(field::RETURN_ON_EQUITY_TTM),
                return_on_assets: percentage(field::RETURN_ON_ASSETS_TTM),
                operating_margin: percentage(field::OPERATING_MARGIN_TTM),
                quarterly_earnings_growth: percentage(field::QUARTERLY_EARNINGS_GROWTH_YOY),
                quarterly_revenue_growth: percentage(field::QUARTERLY_REVENUE_GROWTH_YOY),
            },
            valuation: ValuationMetrics {
                trailing_pe: ratio(field::TRAILING_PE),
                forward_pe: ratio(field::FORWARD_PE),
                price_to_sales: ratio(field::PRICE_TO_SALES_RATIO_TTM),
                price_to_book: ratio(field::PRICE_TO_BOOK_RATIO),
                peg_ratio: ratio(field::PEG_RATIO),
            },
        }
    }
}
