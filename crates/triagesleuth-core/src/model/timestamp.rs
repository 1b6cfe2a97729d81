/// Canonical timestamp value: UTC, whole seconds, rendered as the fixed-width
/// `YYYY-MM-DD HH:MM:SS`, or the sentinel `N/A` when absent.
///
/// Serializes to exactly that text so records round-trip through JSON/CSV.
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Text used for a missing timestamp.
pub const MISSING: &str = "N/A";

/// `strftime` pattern of the canonical form.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Years that fit the four-digit field of [`FORMAT`].
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalTime(Option<DateTime<Utc>>);

impl CanonicalTime {
    pub const MISSING: Self = Self(None);

    /// Build from an instant, truncating sub-second precision. Instants
    /// outside years 0000..=9999 collapse to `N/A`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        if !YEARS.contains(&dt.year()) {
            return Self(None);
        }
        Self(dt.with_nanosecond(0).or(Some(dt)))
    }

    /// Build from epoch seconds. Out-of-range values collapse to `N/A`.
    pub fn from_epoch_seconds(secs: i64) -> Self {
        DateTime::from_timestamp(secs, 0).map_or(Self(None), Self::from_datetime)
    }

    /// Parse the canonical text form. `N/A` yields a missing timestamp.
    pub fn parse(text: &str) -> Result<Self, chrono::ParseError> {
        if text == MISSING {
            return Ok(Self(None));
        }
        let naive = NaiveDateTime::parse_from_str(text, FORMAT)?;
        Ok(Self::from_datetime(naive.and_utc()))
    }

    #[inline]
    pub fn get(self) -> Option<DateTime<Utc>> {
        self.0
    }

    #[inline]
    pub fn is_missing(self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<DateTime<Utc>>> for CanonicalTime {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(dt) => Self::from_datetime(dt),
            None => Self(None),
        }
    }
}

impl fmt::Display for CanonicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!(f, "{}", dt.format(FORMAT)),
            None => f.write_str(MISSING),
        }
    }
}

impl Serialize for CanonicalTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
