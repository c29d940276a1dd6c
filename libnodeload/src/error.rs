use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// The five positional fields of a load annotation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Interval,
    Value,
    Threshold,
    Weight,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Timestamp => "timestamp",
            Field::Interval => "interval",
            Field::Value => "value",
            Field::Threshold => "threshold",
            Field::Weight => "weight",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error(transparent)]
    Int(#[from] ParseIntError),

    #[error(transparent)]
    Float(#[from] ParseFloatError),
}

/// Why a load annotation value could not be turned into a usable sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("value format error: expected 5 fields, got {fields}")]
    MalformedFormat { fields: usize },

    #[error("value format error: invalid {field} field")]
    MalformedNumber {
        field: Field,
        #[source]
        source: NumberError,
    },

    #[error("value invalid, sample is {age}s old but may be at most {max_age}s old")]
    Stale { age: i64, max_age: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("node {0} not found")]
    NodeNotFound(String),
}
