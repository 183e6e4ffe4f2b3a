// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Enumeration of consecutive calendar units between two paths

use crate::calendar::CalendarPath;
use crate::error::{Result, TimeTreeError};
use crate::storage::VertexId;

/// Every unit from `start` through `end` inclusive, in ascending order
#[derive(Debug, Clone)]
pub struct CalendarRange {
    next: Option<CalendarPath>,
    end: CalendarPath,
}

impl Iterator for CalendarRange {
    type Item = CalendarPath;

    fn next(&mut self) -> Option<CalendarPath> {
        let current = self.next.take()?;
        if current < self.end {
            self.next = current.successor();
        }
        Some(current)
    }
}

pub struct RangeEnumerator;

impl RangeEnumerator {
    /// Units between two paths of the same resolution. Fails with
    /// `InvalidRange` when `start` is after `end`.
    pub fn units(start: &CalendarPath, end: &CalendarPath) -> Result<CalendarRange> {
        if start.resolution() != end.resolution() {
            return Err(TimeTreeError::InvalidRange(format!(
                "{} and {} have different resolutions",
                start, end
            )));
        }
        if start > end {
            return Err(TimeTreeError::InvalidRange(format!("{} is after {}", start, end)));
        }
        Ok(CalendarRange {
            next: Some(start.clone()),
            end: end.clone(),
        })
    }

    /// Resolve every unit in the range with `resolve_unit`, in order.
    ///
    /// Each call is expected to run in its own transaction, so units
    /// resolved before a failure stay materialized.
    pub fn resolve<F>(start: &CalendarPath, end: &CalendarPath, mut resolve_unit: F) -> Result<Vec<VertexId>>
    where
        F: FnMut(&CalendarPath) -> Result<VertexId>,
    {
        Self::units(start, end)?
            .map(|unit| resolve_unit(&unit))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(values: &[i32]) -> CalendarPath {
        CalendarPath::from_values(values).unwrap()
    }

    #[test]
    fn test_days_across_month_boundary() {
        let units: Vec<Vec<i32>> = RangeEnumerator::units(&path(&[2013, 1, 30]), &path(&[2013, 2, 2]))
            .unwrap()
            .map(|p| p.values())
            .collect();
        assert_eq!(
            units,
            vec![vec![2013, 1, 30], vec![2013, 1, 31], vec![2013, 2, 1], vec![2013, 2, 2]]
        );
    }

    #[test]
    fn test_single_unit_range() {
        let day = path(&[2013, 5, 4]);
        assert_eq!(RangeEnumerator::units(&day, &day).unwrap().count(), 1);
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        assert!(matches!(
            RangeEnumerator::units(&path(&[2013, 5, 5]), &path(&[2013, 5, 4])),
            Err(TimeTreeError::InvalidRange(_))
        ));
        assert!(matches!(
            RangeEnumerator::units(&path(&[2013, 5]), &path(&[2013, 5, 4])),
            Err(TimeTreeError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_resolve_stops_at_first_failure() {
        let mut seen = 0;
        let result = RangeEnumerator::resolve(&path(&[2013, 1]), &path(&[2013, 6]), |unit| {
            seen += 1;
            if unit.values()[1] == 3 {
                Err(TimeTreeError::PathNotFound(unit.to_string()))
            } else {
                Ok(VertexId(seen))
            }
        });
        assert!(result.is_err());
        assert_eq!(seen, 3);
    }
}
