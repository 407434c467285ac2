use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Field names used by the company overview payload.
pub mod field {
    pub const SYMBOL: &str = "Symbol";
    pub const NAME: &str = "Name";
    pub const DESCRIPTION: &str = "Description";
    pub const EXCHANGE: &str = "Exchange";
    pub const COUNTRY: &str = "Country";
    pub const SECTOR: &str = "Sector";
    pub const INDUSTRY: &str = "Industry";
    pub const MARKET_CAPITALIZATION: &str = "MarketCapitalization";
    pub const SHARES_OUTSTANDING: &str = "SharesOutstanding";
    pub const EPS: &str = "EPS";
    pub const PE_RATIO: &str = "PERatio";
    pub const WEEK_52_HIGH: &str = "52WeekHigh";
    pub const WEEK_52_LOW: &str = "52WeekLow";
    pub const LATEST_QUARTER: &str = "LatestQuarter";
    pub const BETA: &str = "Beta";
    pub const DIVIDEND_YIELD: &str = "DividendYield";
    pub const DIVIDEND_PER_SHARE: &str = "DividendPerShare";
    pub const REVENUE_TTM: &str = "RevenueTTM";
    pub const REVENUE_PER_SHARE_TTM: &str = "RevenuePerShareTTM";
    pub const PROFIT_MARGIN: &str = "ProfitMargin";
    pub const EBITDA: &str = "EBITDA";
    pub const RETURN_ON_EQUITY_TTM: &str = "ReturnOnEquityTTM";
    pub const RETURN_ON_ASSETS_TTM: &str = "ReturnOnAssetsTTM";
    pub const OPERATING_MARGIN_TTM: &str = "OperatingMarginTTM";
    pub const QUARTERLY_EARNINGS_GROWTH_YOY: &str = "QuarterlyEarningsGrowthYOY";
    pub const QUARTERLY_REVENUE_GROWTH_YOY: &str = "QuarterlyRevenueGrowthYOY";
    pub const TRAILING_PE: &str = "TrailingPE";
    pub const FORWARD_PE: &str = "ForwardPE";
    pub const PRICE_TO_SALES_RATIO_TTM: &str = "PriceToSalesRatioTTM";
    pub const PRICE_TO_BOOK_RATIO: &str = "PriceToBookRatio";
    pub const PEG_RATIO: &str = "PEGRatio";
    pub const ANALYST_TARGET_PRICE: &str = "AnalystTargetPrice";
    pub const ANALYST_RATING_STRONG_BUY: &str = "AnalystRatingStrongBuy";
    pub const ANALYST_RATING_BUY: &str = "AnalystRatingBuy";
    pub const ANALYST_RATING_HOLD: &str = "AnalystRatingHold";
    pub const ANALYST_RATING_SELL: &str = "AnalystRatingSell";
    pub const ANALYST_RATING_STRONG_SELL: &str = "AnalystRatingStrongSell";
}

/// Company fundamentals snapshot, kept as the flat name/value map the
/// upstream returns. Numeric values are stored as their decimal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OverviewRecord {
    fields: BTreeMap<String, String>,
}

impl OverviewRecord {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Keep scalar members of a decoded JSON object. Nulls, arrays and nested
    /// objects carry no overview field and are dropped.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let fields = object
            .iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((name.clone(), text))
            })
            .collect();

        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn symbol(&self) -> Option<&str> {
        self.get(field::SYMBOL)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(field::NAME)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'de> Deserialize<'de> for OverviewRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_json_object(&object))
    }
}
