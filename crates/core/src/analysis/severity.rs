//! dNBR burn severity classes
//!
//! Eight classes from strong regrowth to extreme severity. Thresholds are
//! evaluated in order with a strict `<`, so a value sitting exactly on a
//! breakpoint belongs to the class above it. Together the bins cover the
//! whole real line.
//!
//! | Class | dNBR range       | Label                  |
//! |-------|------------------|------------------------|
//! | 0     | < -0.500         | High Regrowth          |
//! | 1     | [-0.500, -0.251) | Low Regrowth           |
//! | 2     | [-0.251, -0.101) | Unburned               |
//! | 3     | [-0.101, 0.100)  | Low Severity           |
//! | 4     | [0.100, 0.270)   | Moderate-Low Severity  |
//! | 5     | [0.270, 0.440)   | Moderate-High Severity |
//! | 6     | [0.440, 0.660)   | High Severity          |
//! | 7     | >= 0.660         | Extreme Severity       |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::{FirePerimeter, Raster};

/// Upper (exclusive) dNBR bound of classes 0 through 6
pub const SEVERITY_BREAKS: [f32; 7] = [-0.500, -0.251, -0.101, 0.100, 0.270, 0.440, 0.660];

/// Burn severity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SeverityClass {
    HighRegrowth = 0,
    LowRegrowth = 1,
    Unburned = 2,
    LowSeverity = 3,
    ModerateLowSeverity = 4,
    ModerateHighSeverity = 5,
    HighSeverity = 6,
    ExtremeSeverity = 7,
}

impl SeverityClass {
    /// All classes in ascending order
    pub const ALL: [SeverityClass; 8] = [
        Self::HighRegrowth,
        Self::LowRegrowth,
        Self::Unburned,
        Self::LowSeverity,
        Self::ModerateLowSeverity,
        Self::ModerateHighSeverity,
        Self::HighSeverity,
        Self::ExtremeSeverity,
    ];

    /// Number of classes
    pub const COUNT: usize = 8;

    /// Classify a dNBR value; NaN has no class.
    #[must_use]
    pub fn from_dnbr(d: f32) -> Option<Self> {
        if d.is_nan() {
            return None;
        }
        let idx = SEVERITY_BREAKS
            .iter()
            .position(|&upper| d < upper)
            .unwrap_or(SEVERITY_BREAKS.len());
        Some(Self::ALL[idx])
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable class name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighRegrowth => "High Regrowth",
            Self::LowRegrowth => "Low Regrowth",
            Self::Unburned => "Unburned",
            Self::LowSeverity => "Low Severity",
            Self::ModerateLowSeverity => "Moderate-Low Severity",
            Self::ModerateHighSeverity => "Moderate-High Severity",
            Self::HighSeverity => "High Severity",
            Self::ExtremeSeverity => "Extreme Severity",
        }
    }

    /// Display colour as `#RRGGBB`
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::HighRegrowth => "#006400",
            Self::LowRegrowth => "#7FFF00",
            Self::Unburned => "#FFFFCC",
            Self::LowSeverity => "#FFFF00",
            Self::ModerateLowSeverity => "#FEC965",
            Self::ModerateHighSeverity => "#FD8D3C",
            Self::HighSeverity => "#B10026",
            Self::ExtremeSeverity => "#4B0000",
        }
    }

    /// Half-open dNBR range `[lower, upper)` covered by the class
    #[must_use]
    pub fn dnbr_range(self) -> (f32, f32) {
        let i = self.index();
        let lower = if i == 0 {
            f32::NEG_INFINITY
        } else {
            SEVERITY_BREAKS[i - 1]
        };
        let upper = SEVERITY_BREAKS.get(i).copied().unwrap_or(f32::INFINITY);
        (lower, upper)
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a dNBR raster and clip it to the perimeter.
pub fn classify(dnbr: &Raster<f32>, perimeter: &FirePerimeter) -> Raster<SeverityClass> {
    dnbr.map(SeverityClass::from_dnbr).clip(perimeter)
}
