//! Multispectral scenes
//!
//! A scene is one satellite acquisition: catalog metadata plus a set of named
//! bands on a common grid. Reflectance bands hold surface reflectance digital
//! numbers; the scene classification band holds per-pixel class codes. Both
//! are stored as `u16` so a scene is a single homogeneous band map.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SeverityError};
use crate::grid::{Bounds, GridSpec, Raster};

/// Near-infrared band (Sentinel-2 B8, 842 nm)
pub const BAND_NIR: &str = "B8";
/// Short-wave infrared band (Sentinel-2 B12, 2190 nm)
pub const BAND_SWIR2: &str = "B12";
/// Scene Classification Layer
pub const BAND_SCL: &str = "SCL";

/// Catalog metadata, available without loading pixel data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub id: String,
    pub acquired: NaiveDate,
    /// Share of the scene flagged cloudy by the provider (0-100)
    pub cloudy_pixel_percentage: f32,
    pub grid: GridSpec,
}

impl SceneMetadata {
    /// Ground footprint of the scene
    pub fn footprint(&self) -> Bounds {
        self.grid.bounds()
    }
}

/// A scene with its band rasters loaded
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    metadata: SceneMetadata,
    bands: BTreeMap<String, Raster<u16>>,
}

impl Scene {
    /// Create an empty scene; add bands with [`Scene::with_band`].
    pub fn new(metadata: SceneMetadata) -> Self {
        Self {
            metadata,
            bands: BTreeMap::new(),
        }
    }

    /// Attach a band.
    ///
    /// # Errors
    /// - [`SeverityError::InvalidConfig`] if the scene grid is empty or degenerate
    /// - [`SeverityError::GridMismatch`] if the band's grid differs from the
    ///   scene grid
    pub fn with_band(mut self, name: impl Into<String>, raster: Raster<u16>) -> Result<Self> {
        self.metadata.grid.validate().map_err(|msg| {
            SeverityError::InvalidConfig(format!("scene '{}': {msg}", self.metadata.id))
        })?;
        if !raster.grid().is_aligned_with(&self.metadata.grid) {
            return Err(SeverityError::GridMismatch {
                scene: self.metadata.id.clone(),
            });
        }
        self.bands.insert(name.into(), raster);
        Ok(self)
    }

    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn grid(&self) -> &GridSpec {
        &self.metadata.grid
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    /// Band by name.
    ///
    /// # Errors
    /// Returns [`SeverityError::MissingBand`] if the scene has no such band.
    pub fn band(&self, name: &str) -> Result<&Raster<u16>> {
        self.bands.get(name).ok_or_else(|| SeverityError::MissingBand {
            scene: self.metadata.id.clone(),
            band: name.to_string(),
        })
    }

    /// Apply the same validity mask to every band.
    ///
    /// # Errors
    /// Returns [`SeverityError::GridMismatch`] if `keep` is on another grid.
    pub fn update_mask(&self, keep: &Raster<bool>) -> Result<Scene> {
        let bands = self
            .bands
            .iter()
            .map(|(name, band)| Ok((name.clone(), band.update_mask(keep, &self.metadata.id)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Scene {
            metadata: self.metadata.clone(),
            bands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> SceneMetadata {
        SceneMetadata {
            id: "S2A_TEST".to_string(),
            acquired: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            cloudy_pixel_percentage: 3.0,
            grid: GridSpec::projected(2, 2, 0.0, 20.0, 10.0),
        }
    }

    #[test]
    fn test_missing_band_reports_scene_and_name() {
        let scene = Scene::new(metadata());
        match scene.band(BAND_NIR) {
            Err(SeverityError::MissingBand { scene, band }) => {
                assert_eq!(scene, "S2A_TEST");
                assert_eq!(band, "B8");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_band_on_other_grid_rejected() {
        let other = GridSpec::projected(3, 2, 0.0, 20.0, 10.0);
        let result = Scene::new(metadata()).with_band(BAND_NIR, Raster::filled(other, 1));
        assert!(matches!(result, Err(SeverityError::GridMismatch { .. })));
    }

    #[test]
    fn test_band_on_empty_grid_rejected() {
        let grid = GridSpec::projected(0, 3, 0.0, 30.0, 10.0);
        let meta = SceneMetadata { grid, ..metadata() };
        let result = Scene::new(meta).with_band(BAND_NIR, Raster::masked(grid));
        assert!(matches!(result, Err(SeverityError::InvalidConfig(_))));
    }

    #[test]
    fn test_update_mask_applies_to_all_bands() {
        let grid = metadata().grid;
        let scene = Scene::new(metadata())
            .with_band(BAND_NIR, Raster::filled(grid, 3000))
            .unwrap()
            .with_band(BAND_SWIR2, Raster::filled(grid, 1000))
            .unwrap();
        let keep = Raster::from_values("keep", grid, vec![true, false, true, false]).unwrap();
        let masked = scene.update_mask(&keep).unwrap();
        for name in [BAND_NIR, BAND_SWIR2] {
            assert_eq!(masked.band(name).unwrap().valid_count(), 2);
            assert_eq!(masked.band(name).unwrap().at(1), None);
        }
    }
}
