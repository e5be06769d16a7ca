//! Semantic unit types for area and ratio quantities
//!
//! Newtype wrappers keep burned-area figures from being mixed up: an area in
//! square meters cannot be added to one in square kilometers, and a percent
//! of the fire cannot be passed where an area is expected.
//!
//! # Design Philosophy
//! - Area types use f64: per-pixel areas are summed over millions of pixels
//! - Implements common traits (Add, Sum, Ord, Display, etc.)
//! - Provides explicit conversion methods between related types
//! - Serde support for serialization (transparent, so reports hold plain numbers)
//! - Total ordering via Ord trait (NaN handled as greater than all values)
//!
//! # Usage
//! ```
//! use burn_severity_core::core_types::units::{SquareKilometers, SquareMeters};
//!
//! let area = SquareMeters::new(2_500_000.0);
//! let km2: SquareKilometers = area.into();
//! assert!((*km2 - 2.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Deref};

/// Square meters per square kilometer
const M2_PER_KM2: f64 = 1e6;

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// AREA TYPES
// ============================================================================

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareMeters(f64);

impl Eq for SquareMeters {}

impl PartialOrd for SquareMeters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SquareMeters {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for SquareMeters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl SquareMeters {
    /// Zero area
    pub const ZERO: SquareMeters = SquareMeters(0.0);

    /// Create a new area in square meters
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        SquareMeters(value)
    }

    /// Convert to square kilometers
    #[inline]
    #[must_use]
    pub fn to_square_kilometers(self) -> SquareKilometers {
        SquareKilometers(self.0 / M2_PER_KM2)
    }
}

impl From<SquareMeters> for SquareKilometers {
    fn from(a: SquareMeters) -> SquareKilometers {
        a.to_square_kilometers()
    }
}

impl Add for SquareMeters {
    type Output = SquareMeters;
    fn add(self, rhs: SquareMeters) -> SquareMeters {
        SquareMeters(self.0 + rhs.0)
    }
}

impl Sum for SquareMeters {
    fn sum<I: Iterator<Item = SquareMeters>>(iter: I) -> Self {
        iter.fold(SquareMeters::ZERO, Add::add)
    }
}

impl fmt::Display for SquareMeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m²", self.0)
    }
}

/// Area in square kilometers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareKilometers(f64);

impl Eq for SquareKilometers {}

impl PartialOrd for SquareKilometers {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SquareKilometers {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for SquareKilometers {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl SquareKilometers {
    /// Share of `total` expressed as a percentage.
    ///
    /// Returns zero when `total` is not positive, so an empty fire reports
    /// 0% for every class instead of NaN.
    #[must_use]
    pub fn percent_of(self, total: SquareKilometers) -> Percent {
        if total.0 > 0.0 {
            Percent(self.0 / total.0 * 100.0)
        } else {
            Percent(0.0)
        }
    }
}

impl Add for SquareKilometers {
    type Output = SquareKilometers;
    fn add(self, rhs: SquareKilometers) -> SquareKilometers {
        SquareKilometers(self.0 + rhs.0)
    }
}

impl Sum for SquareKilometers {
    fn sum<I: Iterator<Item = SquareKilometers>>(iter: I) -> Self {
        iter.fold(SquareKilometers(0.0), Add::add)
    }
}

impl fmt::Display for SquareKilometers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} km²", self.0)
    }
}

// ============================================================================
// RATIO TYPES
// ============================================================================

/// A percentage (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Percent(f64);

impl Eq for Percent {}

impl PartialOrd for Percent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percent {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Percent {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl From<Percent> for f64 {
    fn from(p: Percent) -> f64 {
        p.0
    }
}

impl Add for Percent {
    type Output = Percent;
    fn add(self, rhs: Percent) -> Percent {
        Percent(self.0 + rhs.0)
    }
}

impl Sum for Percent {
    fn sum<I: Iterator<Item = Percent>>(iter: I) -> Self {
        iter.fold(Percent(0.0), Add::add)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}
