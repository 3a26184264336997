//! Shared primitive types used across the aggregation core.

/// A hierarchical geographic identifier. Digit positions encode
/// state, county, and tract; coarser levels are recovered by
/// integer division.
pub type Geoid = u64;

/// Dividing a tract-level GEOID by this (and flooring) yields the
/// county-level identifier.
pub const GEOID_COUNTY_SCALE: u64 = 1_000_000;
