//! Burn Severity Core Library
//!
//! Maps wildfire burn severity from Sentinel-2 surface reflectance using the
//! differenced Normalized Burn Ratio (dNBR).
//!
//! ## Pipeline
//!
//! - Scene selection by perimeter bounds, date window and cloud cover
//! - Cloud masking with the Scene Classification Layer
//! - Per-pixel median composites for a pre-fire and a post-fire window
//! - NBR per composite, dNBR = pre - post, clipped to the fire perimeter
//! - Classification into eight USGS-style severity classes
//! - Burned area per class in km² and percent of the fire
//!
//! ```no_run
//! use burn_severity_core::{AnalysisConfig, BurnSeverityPipeline, FirePerimeter, ManifestCatalog};
//! use std::path::Path;
//!
//! # fn main() -> burn_severity_core::Result<()> {
//! let catalog = ManifestCatalog::open(Path::new("scenes/manifest.json"))?;
//! let perimeter = FirePerimeter::from_geojson_file(Path::new("perimeter.geojson"))?;
//! let pipeline = BurnSeverityPipeline::new(AnalysisConfig::default())?;
//! let analysis = pipeline.run(&catalog, &perimeter)?;
//! println!("{} km² burned", *analysis.report.areas.total_area_km2);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod core_types;
pub mod error;
pub mod export;
pub mod grid;
pub mod imagery;
pub mod pipeline;
pub mod synthetic;

pub use analysis::{AreaSummary, ClassArea, SeverityClass};
pub use config::AnalysisConfig;
pub use error::{Result, SeverityError};
pub use grid::{FirePerimeter, GridSpec, Polygon, Raster};
pub use imagery::{InMemoryCatalog, ManifestCatalog, Scene, SceneCatalog, SceneMetadata};
pub use pipeline::{BurnSeverityPipeline, SeverityAnalysis, SeverityReport};
pub use synthetic::{SyntheticFire, SyntheticScenario};
