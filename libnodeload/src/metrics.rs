use std::fmt;
use std::str::FromStr;

use crate::error::{Field, NumberError, ParseError};

/// Number of `:` separated fields in a load annotation value.
pub const FIELD_COUNT: usize = 5;

/// A sample older than this many reporting intervals is stale.
pub const STALE_INTERVALS: i64 = 2;

/// One reading of one resource dimension on one node.
///
/// Encoded on the node as `timestamp:interval:value:threshold:weight`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadSample {
    /// Seconds since epoch when the sample was produced.
    pub timestamp: i64,
    /// Expected reporting period, in seconds.
    pub interval: i64,
    /// Observed load, conventionally in `[0, 1]`.
    pub value: f64,
    /// Load above which the node is overloaded. `0` and `1` disable the check.
    pub threshold: f64,
    /// Relative importance of this resource in the node score.
    pub weight: f64,
}

impl LoadSample {
    /// Parses and validates a raw annotation value against `now`.
    pub fn parse(raw: &str, now: i64) -> Result<Self, ParseError> {
        let sample = Self::parse_fields(raw)?;
        sample.check_fresh(now)?;
        Ok(sample)
    }

    /// Decodes the five fields without looking at freshness.
    pub fn parse_fields(raw: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = raw.split(':').collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::MalformedFormat {
                fields: fields.len(),
            });
        }

        Ok(Self {
            timestamp: parse_number(fields[0], Field::Timestamp)?,
            interval: parse_number(fields[1], Field::Interval)?,
            value: parse_number(fields[2], Field::Value)?,
            threshold: parse_number(fields[3], Field::Threshold)?,
            weight: parse_number(fields[4], Field::Weight)?,
        })
    }

    pub fn check_fresh(&self, now: i64) -> Result<(), ParseError> {
        let age = now.saturating_sub(self.timestamp);
        let max_age = self.interval.saturating_mul(STALE_INTERVALS);
        if age > max_age {
            return Err(ParseError::Stale { age, max_age });
        }
        Ok(())
    }

    /// Whether this resource enforces a threshold at all.
    pub fn has_threshold(&self) -> bool {
        self.threshold != 0.0 && self.threshold != 1.0
    }

    pub fn is_overloaded(&self) -> bool {
        self.has_threshold() && self.value > self.threshold
    }
}

fn parse_number<T>(raw: &str, field: Field) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: Into<NumberError>,
{
    raw.parse::<T>()
        .map_err(|e| ParseError::MalformedNumber {
            field,
            source: e.into(),
        })
}

impl FromStr for LoadSample {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_fields(s)
    }
}

impl fmt::Display for LoadSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.timestamp, self.interval, self.value, self.threshold, self.weight
        )
    }
}
