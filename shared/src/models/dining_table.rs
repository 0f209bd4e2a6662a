//! Dining Table Model
//!
//! A device is bound to exactly one physical table. The table number is the
//! only identity the patron provides, so it is validated once at the edge and
//! carried as a [`TableNumber`] everywhere else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lowest accepted table number
pub const MIN_TABLE_NUMBER: u8 = 1;
/// Highest accepted table number
pub const MAX_TABLE_NUMBER: u8 = 100;

/// Table number rejected by validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please enter a valid table number (1-100)")]
pub struct InvalidTableNumber {
    /// The rejected input, as entered
    pub input: String,
}

/// Validated table number in `[1, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct TableNumber(u8);

impl TableNumber {
    /// Validate an integer table number
    pub fn new(value: i64) -> Result<Self, InvalidTableNumber> {
        if (i64::from(MIN_TABLE_NUMBER)..=i64::from(MAX_TABLE_NUMBER)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidTableNumber {
                input: value.to_string(),
            })
        }
    }

    /// Validate user input such as `"12"` or `" 7 "`
    pub fn parse(input: &str) -> Result<Self, InvalidTableNumber> {
        let invalid = || InvalidTableNumber {
            input: input.to_string(),
        };
        let value: i64 = input.trim().parse().map_err(|_| invalid())?;
        Self::new(value).map_err(|_| invalid())
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for TableNumber {
    type Error = InvalidTableNumber;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableNumber> for u8 {
    fn from(table: TableNumber) -> Self {
        table.0
    }
}

impl FromStr for TableNumber {
    type Err = InvalidTableNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TableNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
