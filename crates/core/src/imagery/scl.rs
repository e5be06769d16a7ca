//! Scene Classification Layer (SCL) cloud masking
//!
//! # Sentinel-2 SCL codes
//!
//! - Code 0: No data
//! - Code 1: Saturated or defective
//! - Code 2: Dark area pixels
//! - Code 3: Cloud shadows
//! - Code 4: Vegetation
//! - Code 5: Bare soils
//! - Code 6: Water
//! - Code 7: Unclassified
//! - Code 8: Cloud medium probability
//! - Code 9: Cloud high probability
//! - Code 10: Thin cirrus
//! - Code 11: Snow / ice
//!
//! Clear-sky surface classes are kept; clouds, shadows, cirrus, saturated
//! and no-data pixels are masked across every band of the scene.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::scene::Scene;
use crate::error::Result;

/// SCL codes kept by default: dark features, vegetation, bare soil, water,
/// unclassified and snow/ice
pub const DEFAULT_VALID_SCL: [u8; 6] = [2, 4, 5, 6, 7, 11];

/// Scene classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SclClass {
    NoData = 0,
    Saturated = 1,
    DarkFeatures = 2,
    CloudShadow = 3,
    Vegetation = 4,
    BareSoil = 5,
    Water = 6,
    Unclassified = 7,
    CloudMedium = 8,
    CloudHigh = 9,
    ThinCirrus = 10,
    SnowIce = 11,
}

impl SclClass {
    /// Class for a raw SCL code, `None` for codes outside 0-11
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => Self::NoData,
            1 => Self::Saturated,
            2 => Self::DarkFeatures,
            3 => Self::CloudShadow,
            4 => Self::Vegetation,
            5 => Self::BareSoil,
            6 => Self::Water,
            7 => Self::Unclassified,
            8 => Self::CloudMedium,
            9 => Self::CloudHigh,
            10 => Self::ThinCirrus,
            11 => Self::SnowIce,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Per-pixel mask built from the scene classification band
#[derive(Debug, Clone)]
pub struct SclMask {
    band: String,
    valid: FxHashSet<u16>,
}

impl SclMask {
    /// Mask keeping the given SCL codes, reading classes from `band`.
    pub fn new(band: impl Into<String>, valid_codes: &[u8]) -> Self {
        Self {
            band: band.into(),
            valid: valid_codes.iter().map(|&c| u16::from(c)).collect(),
        }
    }

    /// Whether a raw SCL code passes the mask.
    #[inline]
    pub fn keeps(&self, code: u16) -> bool {
        self.valid.contains(&code)
    }

    /// Mask every band of `scene` where the classification is not clear sky.
    ///
    /// Pixels whose SCL value is itself masked stay masked.
    ///
    /// # Errors
    /// Returns an error if the scene has no classification band.
    pub fn apply(&self, scene: &Scene) -> Result<Scene> {
        let scl = scene.band(&self.band)?;
        let keep = scl.map(|code| Some(self.keeps(code)));
        scene.update_mask(&keep)
    }
}

impl Default for SclMask {
    fn default() -> Self {
        Self::new(super::scene::BAND_SCL, &DEFAULT_VALID_SCL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridSpec, Raster};
    use crate::imagery::scene::{SceneMetadata, BAND_NIR, BAND_SCL};
    use chrono::NaiveDate;

    #[test]
    fn test_default_keeps_exactly_clear_classes() {
        let mask = SclMask::default();
        let kept: Vec<u16> = (0..=15).filter(|&c| mask.keeps(c)).collect();
        assert_eq!(kept, vec![2, 4, 5, 6, 7, 11]);
    }

    #[test]
    fn test_class_codes_round_trip() {
        for code in 0..=11u16 {
            let class = SclClass::from_code(code).unwrap();
            assert_eq!(u16::from(class.code()), code);
        }
        assert_eq!(SclClass::from_code(12), None);
    }

    #[test]
    fn test_apply_masks_clouds_in_all_bands() {
        let grid = GridSpec::projected(4, 1, 0.0, 10.0, 10.0);
        let meta = SceneMetadata {
            id: "t".to_string(),
            acquired: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            cloudy_pixel_percentage: 10.0,
            grid,
        };
        let scene = Scene::new(meta)
            .with_band(BAND_NIR, Raster::from_values("B8", grid, vec![10, 20, 30, 40]).unwrap())
            .unwrap()
            .with_band(
                BAND_SCL,
                Raster::from_values("SCL", grid, vec![4, 9, 3, 11]).unwrap(),
            )
            .unwrap();

        let masked = SclMask::default().apply(&scene).unwrap();
        assert_eq!(
            masked.band(BAND_NIR).unwrap().cells(),
            &[Some(10), None, None, Some(40)]
        );
        assert_eq!(masked.band(BAND_SCL).unwrap().valid_count(), 2);
    }

    #[test]
    fn test_missing_scl_band_is_an_error() {
        let grid = GridSpec::projected(1, 1, 0.0, 10.0, 10.0);
        let meta = SceneMetadata {
            id: "no-scl".to_string(),
            acquired: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            cloudy_pixel_percentage: 0.0,
            grid,
        };
        assert!(SclMask::default().apply(&Scene::new(meta)).is_err());
    }
}
