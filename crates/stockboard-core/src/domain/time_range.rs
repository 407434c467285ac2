use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Chart window selected by the user.
///
/// Every range requests the same intraday series; the range only decides how
/// many of the most recent points are kept for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1week")]
    OneWeek,
    #[default]
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl TimeRange {
    pub const ALL: [Self; 3] = [Self::OneWeek, Self::OneMonth, Self::ThreeMonths];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneWeek => "1week",
            Self::OneMonth => "1month",
            Self::ThreeMonths => "3months",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneWeek => "1 Week",
            Self::OneMonth => "1 Month",
            Self::ThreeMonths => "3 Months",
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact = value
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match compact.as_str() {
            "1week" | "1w" => Ok(Self::OneWeek),
            "1month" | "1m" => Ok(Self::OneMonth),
            "3months" | "3month" | "3m" => Ok(Self::ThreeMonths),
            _ => Err(ValidationError::InvalidTimeRange {
                value: value.trim().to_owned(),
            }),
        }
    }
}
