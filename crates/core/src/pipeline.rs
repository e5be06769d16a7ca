//! End-to-end burn severity analysis
//!
//! Chains the stages once, in order:
//!
//! 1. Query pre- and post-fire scenes over the perimeter (bounds, dates, cloud cover)
//! 2. Mask clouds with the scene classification band
//! 3. Median-composite each window and clip to the perimeter
//! 4. NBR per window, then dNBR = pre - post
//! 5. Classify dNBR into severity classes
//! 6. Sum burned area per class

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{class_areas, classify, dnbr, nbr, AreaSummary, SeverityClass};
use crate::config::AnalysisConfig;
use crate::core_types::DateWindow;
use crate::error::Result;
use crate::grid::{FirePerimeter, GridSpec, Raster};
use crate::imagery::{Composite, Scene, SceneCatalog, SceneQuery, SclMask};

/// What went into one composite window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub window: DateWindow,
    pub scene_ids: Vec<String>,
    /// Perimeter pixels with a valid NBR
    pub valid_pixels: usize,
}

/// Serializable outcome of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityReport {
    pub config: AnalysisConfig,
    pub grid: GridSpec,
    pub pre_fire: WindowSummary,
    pub post_fire: WindowSummary,
    /// Smallest and largest dNBR inside the perimeter
    pub dnbr_range: Option<(f32, f32)>,
    pub areas: AreaSummary,
}

/// Intermediate rasters, kept for export and inspection
#[derive(Debug, Clone)]
pub struct SeverityProducts {
    pub pre_composite: Composite,
    pub post_composite: Composite,
    pub nbr_pre: Raster<f32>,
    pub nbr_post: Raster<f32>,
    pub dnbr: Raster<f32>,
    pub severity: Raster<SeverityClass>,
}

/// Report plus the rasters it was computed from
#[derive(Debug, Clone)]
pub struct SeverityAnalysis {
    pub report: SeverityReport,
    pub products: SeverityProducts,
}

/// Configured burn severity pipeline
#[derive(Debug, Clone)]
pub struct BurnSeverityPipeline {
    config: AnalysisConfig,
    mask: SclMask,
    pre_window: DateWindow,
    post_window: DateWindow,
}

impl BurnSeverityPipeline {
    /// Validate `config` and prepare the pipeline.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let pre_window = config.pre_fire_window()?;
        let post_window = config.post_fire_window()?;
        if pre_window.end > post_window.start {
            warn!(
                pre = %pre_window,
                post = %post_window,
                "pre-fire window overlaps the post-fire window"
            );
        }
        let mask = SclMask::new(config.bands.scl.clone(), &config.valid_scl_classes);
        Ok(Self {
            config,
            mask,
            pre_window,
            post_window,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn pre_window(&self) -> DateWindow {
        self.pre_window
    }

    pub fn post_window(&self) -> DateWindow {
        self.post_window
    }

    /// Catalog query for one window over the perimeter
    pub fn query(&self, window: DateWindow, perimeter: &FirePerimeter) -> SceneQuery {
        SceneQuery::new()
            .filter_bounds(perimeter.bounds())
            .filter_date(window)
            .max_cloudy_pixel_percentage(self.config.max_cloudy_pixel_percentage)
    }

    /// Cloud-masked, clipped median composite of one window.
    ///
    /// # Errors
    /// Returns an error if no scene matches or scenes lack required bands.
    pub fn composite(
        &self,
        label: &str,
        window: DateWindow,
        catalog: &dyn SceneCatalog,
        perimeter: &FirePerimeter,
    ) -> Result<Composite> {
        let scenes = catalog.query(&self.query(window, perimeter))?;
        info!(window = label, range = %window, scenes = scenes.len(), "selected scenes");
        let masked = scenes
            .iter()
            .map(|s| self.mask.apply(s))
            .collect::<Result<Vec<Scene>>>()?;
        let bands = [self.config.bands.nir.as_str(), self.config.bands.swir2.as_str()];
        Ok(Composite::median(label, &masked, &bands)?.clip(perimeter))
    }

    /// Run every stage and collect the report and rasters.
    ///
    /// # Errors
    /// Returns an error if either window has no usable scene, required bands
    /// are missing, or the two composites are on different grids.
    pub fn run(
        &self,
        catalog: &dyn SceneCatalog,
        perimeter: &FirePerimeter,
    ) -> Result<SeverityAnalysis> {
        let bands = &self.config.bands;

        let pre_composite = self.composite("pre-fire", self.pre_window, catalog, perimeter)?;
        let post_composite = self.composite("post-fire", self.post_window, catalog, perimeter)?;

        let nbr_pre = nbr(&pre_composite, &bands.nir, &bands.swir2)?;
        let nbr_post = nbr(&post_composite, &bands.nir, &bands.swir2)?;
        let dnbr = dnbr(&nbr_pre, &nbr_post, perimeter)?;
        let severity = classify(&dnbr, perimeter);
        let areas = class_areas(&severity);

        let dnbr_range = dnbr.min_max();
        if dnbr.valid_count() == 0 {
            warn!("no perimeter pixel has a valid dNBR; all class areas are zero");
        }
        info!(
            valid_pixels = dnbr.valid_count(),
            total_km2 = *areas.total_area_km2,
            "burn severity computed"
        );

        let report = SeverityReport {
            config: self.config.clone(),
            grid: *dnbr.grid(),
            pre_fire: WindowSummary {
                window: self.pre_window,
                scene_ids: pre_composite.scene_ids().to_vec(),
                valid_pixels: nbr_pre.valid_count(),
            },
            post_fire: WindowSummary {
                window: self.post_window,
                scene_ids: post_composite.scene_ids().to_vec(),
                valid_pixels: nbr_post.valid_count(),
            },
            dnbr_range,
            areas,
        };

        Ok(SeverityAnalysis {
            report,
            products: SeverityProducts {
                pre_composite,
                post_composite,
                nbr_pre,
                nbr_post,
                dnbr,
                severity,
            },
        })
    }
}
