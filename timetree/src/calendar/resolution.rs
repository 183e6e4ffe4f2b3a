// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Calendar units and resolutions

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TimeTreeError;

/// A calendar unit. Used both as the kind of a tree level and as the
/// resolution (finest level) an instant is materialized at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl Resolution {
    pub const ALL: [Resolution; 7] = [
        Resolution::Year,
        Resolution::Month,
        Resolution::Day,
        Resolution::Hour,
        Resolution::Minute,
        Resolution::Second,
        Resolution::Millisecond,
    ];

    /// Depth of this unit below a root (Year = 1 .. Millisecond = 7)
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    /// Vertex label of tree nodes of this unit
    pub fn label(self) -> &'static str {
        match self {
            Resolution::Year => "Year",
            Resolution::Month => "Month",
            Resolution::Day => "Day",
            Resolution::Hour => "Hour",
            Resolution::Minute => "Minute",
            Resolution::Second => "Second",
            Resolution::Millisecond => "Millisecond",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }

    /// Units from Year down to and including this one
    pub fn units(self) -> &'static [Resolution] {
        &Self::ALL[..self.ordinal()]
    }

    /// Smallest legal value of the unit. Years are bounded by the calendar
    /// range chrono can represent.
    pub fn min_value(self) -> i32 {
        match self {
            Resolution::Month | Resolution::Day => 1,
            Resolution::Year => NaiveDate::MIN.year(),
            _ => 0,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_lowercase())
    }
}

impl FromStr for Resolution {
    type Err = TimeTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "year" => Ok(Resolution::Year),
            "month" => Ok(Resolution::Month),
            "day" => Ok(Resolution::Day),
            "hour" => Ok(Resolution::Hour),
            "minute" => Ok(Resolution::Minute),
            "second" => Ok(Resolution::Second),
            "millisecond" => Ok(Resolution::Millisecond),
            _ => Err(TimeTreeError::InvalidResolution(s.to_string())),
        }
    }
}

impl TryFrom<String> for Resolution {
    type Error = TimeTreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.to_string()
    }
}
