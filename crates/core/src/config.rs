//! Analysis configuration
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! { "fire_date": "2024-05-10", "max_cloudy_pixel_percentage": 10.0 }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core_types::DateWindow;
use crate::error::{Result, SeverityError};
use crate::imagery::{SclClass, BAND_NIR, BAND_SCL, BAND_SWIR2, DEFAULT_VALID_SCL};

/// Day offsets of a composite window relative to the fire date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOffsets {
    /// First day, inclusive
    pub start_days: i64,
    /// Last day, exclusive
    pub end_days: i64,
}

impl WindowOffsets {
    /// 40 to 20 days before the fire, avoiding late snow cover
    pub const PRE_FIRE: Self = Self {
        start_days: -40,
        end_days: -20,
    };

    /// Fire date to roughly two months after
    pub const POST_FIRE: Self = Self {
        start_days: 0,
        end_days: 61,
    };
}

/// Band names used by the analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandNames {
    pub nir: String,
    pub swir2: String,
    pub scl: String,
}

impl Default for BandNames {
    fn default() -> Self {
        Self {
            nir: BAND_NIR.to_string(),
            swir2: BAND_SWIR2.to_string(),
            scl: BAND_SCL.to_string(),
        }
    }
}

/// Parameters of one burn severity analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Main burn date
    pub fire_date: NaiveDate,
    pub pre_fire: WindowOffsets,
    pub post_fire: WindowOffsets,
    /// Scenes above this provider cloud percentage are skipped (inclusive limit)
    pub max_cloudy_pixel_percentage: f32,
    /// SCL codes treated as clear sky
    pub valid_scl_classes: Vec<u8>,
    pub bands: BandNames,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fire_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap_or_default(),
            pre_fire: WindowOffsets::PRE_FIRE,
            post_fire: WindowOffsets::POST_FIRE,
            max_cloudy_pixel_percentage: 20.0,
            valid_scl_classes: DEFAULT_VALID_SCL.to_vec(),
            bands: BandNames::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or fails
    /// [`AnalysisConfig::validate`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SeverityError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Pre-fire acquisition window
    ///
    /// # Errors
    /// Returns an error if the offsets give an empty window.
    pub fn pre_fire_window(&self) -> Result<DateWindow> {
        DateWindow::around(self.fire_date, self.pre_fire.start_days, self.pre_fire.end_days)
    }

    /// Post-fire acquisition window
    ///
    /// # Errors
    /// Returns an error if the offsets give an empty window.
    pub fn post_fire_window(&self) -> Result<DateWindow> {
        DateWindow::around(self.fire_date, self.post_fire.start_days, self.post_fire.end_days)
    }

    /// Check the configuration can drive an analysis.
    ///
    /// # Errors
    /// Returns [`SeverityError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        self.pre_fire_window()?;
        self.post_fire_window()?;
        if !(0.0..=100.0).contains(&self.max_cloudy_pixel_percentage) {
            return Err(SeverityError::InvalidConfig(format!(
                "max_cloudy_pixel_percentage must be within 0-100, got {}",
                self.max_cloudy_pixel_percentage
            )));
        }
        if self.valid_scl_classes.is_empty() {
            return Err(SeverityError::InvalidConfig(
                "valid_scl_classes must not be empty".to_string(),
            ));
        }
        if let Some(bad) = self
            .valid_scl_classes
            .iter()
            .find(|&&c| SclClass::from_code(u16::from(c)).is_none())
        {
            return Err(SeverityError::InvalidConfig(format!(
                "SCL class {bad} is outside 0-11"
            )));
        }
        let BandNames { nir, swir2, scl } = &self.bands;
        if nir.is_empty() || swir2.is_empty() || scl.is_empty() {
            return Err(SeverityError::InvalidConfig(
                "band names must not be empty".to_string(),
            ));
        }
        if nir == swir2 {
            return Err(SeverityError::InvalidConfig(format!(
                "NIR and SWIR2 must be different bands, both are '{nir}'"
            )));
        }
        Ok(())
    }
}
