// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Calendar path resolution
//!
//! Pure conversion of an instant into the ordered calendar fields that name
//! its place in the tree. No I/O happens here.

pub mod path;
pub mod resolution;
pub mod zone;

pub use path::{CalendarPath, PathSegment};
pub use resolution::Resolution;
pub use zone::TimeZoneId;

use crate::error::Result;

/// Resolve an instant from textual resolution and zone identifiers
///
/// Fails with `InvalidResolution` or `InvalidTimeZone` when either name
/// cannot be parsed.
pub fn resolve_path(instant_millis: i64, resolution: &str, zone: &str) -> Result<CalendarPath> {
    let resolution: Resolution = resolution.parse()?;
    let zone: TimeZoneId = zone.parse()?;
    CalendarPath::resolve(instant_millis, resolution, &zone)
}
