use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use crate::ValidationError;

/// Exchange-local wall-clock timestamp as reported by the upstream series.
///
/// Intraday series use `YYYY-MM-DD HH:MM:SS`, daily series use `YYYY-MM-DD`
/// (read as midnight). No offset is attached; ordering is wall-clock ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketTimestamp(PrimitiveDateTime);

impl MarketTimestamp {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidTimestamp {
            value: input.to_owned(),
        };

        if trimmed.len() == 10 {
            let date = Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
                .map_err(|_| invalid())?;
            return Ok(Self(PrimitiveDateTime::new(date, Time::MIDNIGHT)));
        }

        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .map(Self)
        .map_err(|_| invalid())
    }

    pub const fn from_primitive(value: PrimitiveDateTime) -> Self {
        Self(value)
    }

    pub const fn into_inner(self) -> PrimitiveDateTime {
        self.0
    }

    pub fn format(self) -> String {
        self.0
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_else(|_| String::from("<unformattable>"))
    }

    /// `HH:MM`, used for chart axis labels.
    pub fn clock_label(self) -> String {
        format!("{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl Display for MarketTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for MarketTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for MarketTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
