//! Per-pixel median compositing
//!
//! Collapses a masked scene collection into one image: for every band and
//! pixel, the median of the observations that survived masking. Pixels with
//! no clear observation are masked in the composite. Output is `f32`.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use super::scene::Scene;
use crate::error::{Result, SeverityError};
use crate::grid::{FirePerimeter, GridSpec, Raster};

/// Median of `values`, reordering them in place.
///
/// Even counts average the two middle values. Returns `None` for an empty slice.
pub fn median(values: &mut [f32]) -> Option<f32> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        return Some(upper);
    }
    let below = lower.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Some((below + upper) / 2.0)
}

/// Median composite of a scene collection
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    grid: GridSpec,
    scene_ids: Vec<String>,
    bands: BTreeMap<String, Raster<f32>>,
}

impl Composite {
    /// Median-reduce `bands` across `scenes`.
    ///
    /// # Errors
    /// - [`SeverityError::EmptyCollection`] if `scenes` is empty
    /// - [`SeverityError::InvalidConfig`] if the scene grid is empty or degenerate
    /// - [`SeverityError::GridMismatch`] if scenes are on different grids
    /// - [`SeverityError::MissingBand`] if a scene lacks a requested band
    pub fn median(window: &str, scenes: &[Scene], bands: &[&str]) -> Result<Self> {
        let first = scenes.first().ok_or_else(|| SeverityError::EmptyCollection {
            window: window.to_string(),
        })?;
        let grid = *first.grid();
        grid.validate().map_err(|msg| {
            SeverityError::InvalidConfig(format!("{window} composite: {msg}"))
        })?;
        if let Some(odd) = scenes.iter().find(|s| !s.grid().is_aligned_with(&grid)) {
            return Err(SeverityError::GridMismatch {
                scene: odd.id().to_string(),
            });
        }

        let mut out = BTreeMap::new();
        for &name in bands {
            let stack = scenes
                .iter()
                .map(|s| s.band(name))
                .collect::<Result<Vec<_>>>()?;
            let raster = median_stack(name, &grid, &stack)?;
            debug!(
                window,
                band = name,
                valid = raster.valid_count(),
                "median composite band"
            );
            out.insert(name.to_string(), raster);
        }

        Ok(Self {
            grid,
            scene_ids: scenes.iter().map(|s| s.id().to_string()).collect(),
            bands: out,
        })
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Number of scenes that went into the composite
    pub fn scene_count(&self) -> usize {
        self.scene_ids.len()
    }

    /// Ids of the composited scenes, in acquisition order
    pub fn scene_ids(&self) -> &[String] {
        &self.scene_ids
    }

    /// Composite band by name.
    ///
    /// # Errors
    /// Returns [`SeverityError::MissingBand`] if the band was not composited.
    pub fn band(&self, name: &str) -> Result<&Raster<f32>> {
        self.bands.get(name).ok_or_else(|| SeverityError::MissingBand {
            scene: "composite".to_string(),
            band: name.to_string(),
        })
    }

    /// Mask pixels outside the fire perimeter in every band.
    #[must_use]
    pub fn clip(&self, perimeter: &FirePerimeter) -> Self {
        Self {
            grid: self.grid,
            scene_ids: self.scene_ids.clone(),
            bands: self
                .bands
                .iter()
                .map(|(name, band)| (name.clone(), band.clip(perimeter)))
                .collect(),
        }
    }
}

fn median_stack(name: &str, grid: &GridSpec, stack: &[&Raster<u16>]) -> Result<Raster<f32>> {
    let width = grid.width;
    let rows: Vec<Vec<Option<f32>>> = (0..grid.height)
        .into_par_iter()
        .map(|row| {
            let mut samples = Vec::with_capacity(stack.len());
            let start = row * width;
            (start..start + width)
                .map(|idx| {
                    samples.clear();
                    samples.extend(stack.iter().filter_map(|r| r.at(idx)).map(f32::from));
                    median(&mut samples)
                })
                .collect()
        })
        .collect();
    Raster::from_cells(name, *grid, rows.into_iter().flatten().collect())
}
