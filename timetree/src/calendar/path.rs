// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Calendar paths: the ordered (unit, value) sequence leading from a root
//! down to a terminal node

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::resolution::Resolution;
use super::zone::TimeZoneId;
use crate::error::{Result, TimeTreeError};

/// One level of a calendar path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PathSegment {
    pub unit: Resolution,
    pub value: i32,
}

/// Ordered calendar fields from Year down to some resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CalendarPath {
    segments: Vec<PathSegment>,
}

impl CalendarPath {
    /// Resolve an instant (milliseconds since the Unix epoch, negative for
    /// earlier dates) into its local calendar path.
    pub fn resolve(instant_millis: i64, resolution: Resolution, zone: &TimeZoneId) -> Result<Self> {
        let utc: DateTime<Utc> = Utc
            .timestamp_millis_opt(instant_millis)
            .single()
            .ok_or(TimeTreeError::InvalidInstant(instant_millis))?;
        let local = zone.to_local(utc);

        // leap seconds show up as nanosecond overflow past 999ms
        let millis = (local.nanosecond() / 1_000_000).min(999) as i32;
        let fields = [
            local.year(),
            local.month() as i32,
            local.day() as i32,
            local.hour() as i32,
            local.minute() as i32,
            local.second() as i32,
            millis,
        ];

        let segments = resolution
            .units()
            .iter()
            .zip(fields)
            .map(|(unit, value)| PathSegment { unit: *unit, value })
            .collect();
        Ok(Self { segments })
    }

    /// Build a path from explicit values, Year first
    pub fn from_values(values: &[i32]) -> Result<Self> {
        if values.is_empty() || values.len() > Resolution::ALL.len() {
            return Err(TimeTreeError::InvalidResolution(format!(
                "a calendar path needs 1 to 7 levels, got {}",
                values.len()
            )));
        }
        let segments: Vec<PathSegment> = Resolution::ALL
            .iter()
            .zip(values)
            .map(|(unit, value)| PathSegment { unit: *unit, value: *value })
            .collect();
        let path = Self { segments };
        path.validate()?;
        Ok(path)
    }

    fn validate(&self) -> Result<()> {
        for (depth, segment) in self.segments.iter().enumerate() {
            let max = self.max_value_at(depth);
            if segment.value < segment.unit.min_value() || segment.value > max {
                return Err(TimeTreeError::InvalidRange(format!(
                    "{} value {} out of range in {}",
                    segment.unit, segment.value, self
                )));
            }
        }
        Ok(())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn resolution(&self) -> Resolution {
        // paths are never empty
        self.segments
            .last()
            .map_or(Resolution::Year, |segment| segment.unit)
    }

    pub fn values(&self) -> Vec<i32> {
        self.segments.iter().map(|s| s.value).collect()
    }

    /// The first `depth` levels of this path
    pub fn truncated(&self, depth: usize) -> CalendarPath {
        CalendarPath {
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    fn value_at(&self, unit: Resolution) -> Option<i32> {
        self.segments.get(unit.ordinal() - 1).map(|s| s.value)
    }

    /// Largest legal value at `depth`, which for days depends on the month
    fn max_value_at(&self, depth: usize) -> i32 {
        match Resolution::ALL[depth] {
            Resolution::Year => NaiveDate::MAX.year(),
            Resolution::Month => 12,
            Resolution::Day => {
                let year = self.value_at(Resolution::Year).unwrap_or(1970);
                let month = self.value_at(Resolution::Month).unwrap_or(1) as u32;
                days_in_month(year, month)
            }
            Resolution::Hour => 23,
            Resolution::Minute | Resolution::Second => 59,
            Resolution::Millisecond => 999,
        }
    }

    /// The path of the next calendar unit at the same resolution, carrying
    /// into coarser units as needed (Day 31 of January becomes Day 1 of
    /// February). Returns None only past the last representable year.
    pub fn successor(&self) -> Option<CalendarPath> {
        let mut next = self.clone();
        for depth in (0..next.segments.len()).rev() {
            let max = next.max_value_at(depth);
            let segment = &mut next.segments[depth];
            if segment.value < max {
                segment.value += 1;
                return Some(next);
            }
            if depth == 0 {
                return None;
            }
            segment.value = segment.unit.min_value();
        }
        None
    }
}

fn days_in_month(year: i32, month: u32) -> i32 {
    let next_month = if month >= 12 {
        year.checked_add(1).and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    // December of the last representable year has no successor month
    next_month
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day() as i32)
}

impl PartialOrd for CalendarPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalendarPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments
            .iter()
            .map(|s| s.value)
            .cmp(other.segments.iter().map(|s| s.value))
    }
}

impl fmt::Display for CalendarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment.unit {
                Resolution::Year => write!(f, "{:04}", segment.value)?,
                Resolution::Month | Resolution::Day => write!(f, "-{:02}", segment.value)?,
                Resolution::Hour => write!(f, "T{:02}", segment.value)?,
                Resolution::Minute | Resolution::Second => write!(f, ":{:02}", segment.value)?,
                Resolution::Millisecond => write!(f, ".{:03}", segment.value)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn millis(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().timestamp_millis() + i64::from(ms)
    }

    #[test]
    fn test_day_path_has_three_levels() {
        let path = CalendarPath::resolve(millis(2013, 5, 4, 0, 0, 0, 0), Resolution::Day, &TimeZoneId::utc())
            .unwrap();
        assert_eq!(path.values(), vec![2013, 5, 4]);
        assert_eq!(path.depth(), 3);
        assert_eq!(path.resolution(), Resolution::Day);
        assert_eq!(path.to_string(), "2013-05-04");
    }

    #[test]
    fn test_millisecond_path_in_fixed_offset_zone() {
        let zone: TimeZoneId = "GMT+1".parse().unwrap();
        let path = CalendarPath::resolve(
            millis(2014, 4, 5, 13, 56, 22, 123),
            Resolution::Millisecond,
            &zone,
        )
        .unwrap();
        assert_eq!(path.values(), vec![2014, 4, 5, 14, 56, 22, 123]);
        assert_eq!(path.depth(), 7);
    }

    #[test]
    fn test_named_zone_crosses_day_boundary() {
        let zone: TimeZoneId = "America/Los_Angeles".parse().unwrap();
        let path = CalendarPath::resolve(millis(2014, 10, 25, 6, 36, 0, 0), Resolution::Minute, &zone)
            .unwrap();
        assert_eq!(path.values(), vec![2014, 10, 24, 23, 36]);

        let pst: TimeZoneId = "PST".parse().unwrap();
        let path = CalendarPath::resolve(1_414_264_162_000, Resolution::Minute, &pst).unwrap();
        assert_eq!(path.values(), vec![2014, 10, 25, 12, 9]);
    }

    #[test]
    fn test_dates_before_epoch() {
        let path = CalendarPath::resolve(millis(1940, 2, 5, 0, 0, 0, 0), Resolution::Day, &TimeZoneId::utc())
            .unwrap();
        assert_eq!(path.values(), vec![1940, 2, 5]);

        // one millisecond before the epoch
        let path = CalendarPath::resolve(-1, Resolution::Millisecond, &TimeZoneId::utc()).unwrap();
        assert_eq!(path.values(), vec![1969, 12, 31, 23, 59, 59, 999]);
    }

    #[test]
    fn test_successor_carries_into_coarser_units() {
        let jan31 = CalendarPath::from_values(&[2013, 1, 31]).unwrap();
        assert_eq!(jan31.successor().unwrap().values(), vec![2013, 2, 1]);

        let leap = CalendarPath::from_values(&[2012, 2, 28]).unwrap();
        assert_eq!(leap.successor().unwrap().values(), vec![2012, 2, 29]);
        let common = CalendarPath::from_values(&[2013, 2, 28]).unwrap();
        assert_eq!(common.successor().unwrap().values(), vec![2013, 3, 1]);

        let new_year = CalendarPath::from_values(&[2013, 12, 31, 23, 59]).unwrap();
        assert_eq!(new_year.successor().unwrap().values(), vec![2014, 1, 1, 0, 0]);

        let months = CalendarPath::from_values(&[2013, 12]).unwrap();
        assert_eq!(months.successor().unwrap().values(), vec![2014, 1]);
    }

    #[test]
    fn test_from_values_rejects_impossible_dates() {
        assert!(CalendarPath::from_values(&[2013, 2, 30]).is_err());
        assert!(CalendarPath::from_values(&[2013, 13]).is_err());
        assert!(CalendarPath::from_values(&[]).is_err());
    }

    #[test]
    fn test_years_outside_calendar_range_are_errors() {
        for year in [i32::MAX, i32::MIN, NaiveDate::MAX.year() + 1] {
            assert!(matches!(
                CalendarPath::from_values(&[year, 12, 1]),
                Err(TimeTreeError::InvalidRange(_))
            ));
        }

        let last_day = NaiveDate::MAX;
        let path = CalendarPath::from_values(&[last_day.year(), 12, 31]).unwrap();
        assert_eq!(path.successor(), None);
        let last_year = CalendarPath::from_values(&[last_day.year()]).unwrap();
        assert_eq!(last_year.successor(), None);
    }

    #[test]
    fn test_ordering_is_lexicographic_by_value() {
        let a = CalendarPath::from_values(&[2013, 5, 4]).unwrap();
        let b = CalendarPath::from_values(&[2013, 5, 7]).unwrap();
        let c = CalendarPath::from_values(&[2014, 1, 1]).unwrap();
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.truncated(2), b.truncated(2));
    }
}
