// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Time zone identifiers
//!
//! Accepted forms:
//! - IANA names from the compiled-in `chrono-tz` database (`Europe/Prague`, `UTC`)
//! - fixed offsets with the conventional sign (`GMT+1`, `UTC-05:30`, `+02:00`)
//! - legacy three-letter ids (`PST`, `CST`, `JST`, ...) mapped to the IANA
//!   zone they stand for, daylight-saving rules included

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TimeTreeError;

static OFFSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:GMT|UTC|UT)\s*)?([+-])(\d{1,2})(?::?(\d{2}))?$")
        .expect("offset pattern is valid")
});

/// Short ids still found in older configurations and client code
static LEGACY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ACT", "Australia/Darwin"),
        ("AET", "Australia/Sydney"),
        ("AGT", "America/Argentina/Buenos_Aires"),
        ("ART", "Africa/Cairo"),
        ("AST", "America/Anchorage"),
        ("BET", "America/Sao_Paulo"),
        ("BST", "Asia/Dhaka"),
        ("CAT", "Africa/Harare"),
        ("CNT", "America/St_Johns"),
        ("CST", "America/Chicago"),
        ("CTT", "Asia/Shanghai"),
        ("EAT", "Africa/Addis_Ababa"),
        ("ECT", "Europe/Paris"),
        ("IET", "America/Indiana/Indianapolis"),
        ("IST", "Asia/Kolkata"),
        ("JST", "Asia/Tokyo"),
        ("MIT", "Pacific/Apia"),
        ("NET", "Asia/Yerevan"),
        ("NST", "Pacific/Auckland"),
        ("PLT", "Asia/Karachi"),
        ("PNT", "America/Phoenix"),
        ("PRT", "America/Puerto_Rico"),
        ("PST", "America/Los_Angeles"),
        ("SST", "Pacific/Guadalcanal"),
        ("VST", "Asia/Ho_Chi_Minh"),
    ])
});

/// A resolved time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeZoneId {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for TimeZoneId {
    fn default() -> Self {
        TimeZoneId::utc()
    }
}

impl TimeZoneId {
    pub fn utc() -> Self {
        TimeZoneId::Named(Tz::UTC)
    }

    /// Wall-clock date and time of `instant` in this zone
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimeZoneId::Named(tz) => instant.with_timezone(tz).naive_local(),
            TimeZoneId::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }

    fn parse_offset(s: &str) -> Option<Result<FixedOffset, TimeTreeError>> {
        let captures = OFFSET_PATTERN.captures(s)?;
        let sign = if &captures[1] == "-" { -1 } else { 1 };
        let hours: i32 = captures[2].parse().ok()?;
        let minutes: i32 = captures
            .get(3)
            .map_or(Some(0), |m| m.as_str().parse().ok())?;
        if hours > 23 || minutes > 59 {
            return Some(Err(TimeTreeError::InvalidTimeZone(s.to_string())));
        }
        Some(
            FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
                .ok_or_else(|| TimeTreeError::InvalidTimeZone(s.to_string())),
        )
    }
}

impl FromStr for TimeZoneId {
    type Err = TimeTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        if id.is_empty() {
            return Err(TimeTreeError::InvalidTimeZone(s.to_string()));
        }
        if let Some(offset) = Self::parse_offset(id) {
            return offset.map(TimeZoneId::Fixed);
        }
        let name = LEGACY_ALIASES
            .get(id.to_uppercase().as_str())
            .copied()
            .unwrap_or(id);
        name.parse::<Tz>()
            .map(TimeZoneId::Named)
            .map_err(|_| TimeTreeError::InvalidTimeZone(s.to_string()))
    }
}

impl fmt::Display for TimeZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneId::Named(tz) => write!(f, "{}", tz.name()),
            TimeZoneId::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl TryFrom<String> for TimeZoneId {
    type Error = TimeTreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeZoneId> for String {
    fn from(zone: TimeZoneId) -> Self {
        zone.to_string()
    }
}
