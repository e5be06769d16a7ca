//! Error type shared by every stage of the severity pipeline.
//!
//! Per-pixel conditions (zero denominators, pixels with no clear observation)
//! never surface here: they become masked pixels. Errors are reserved for
//! problems that make a stage impossible to evaluate.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = SeverityError> = std::result::Result<T, E>;

/// Failure modes of the burn severity pipeline.
#[derive(Debug, Error)]
pub enum SeverityError {
    /// Analysis configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No scene survived filtering for a composite window.
    #[error("no scenes available for the {window} window")]
    EmptyCollection { window: String },

    /// A scene lacks a band required by the analysis.
    #[error("scene '{scene}' has no band '{band}'")]
    MissingBand { scene: String, band: String },

    /// Raster grids that must line up pixel-for-pixel do not.
    #[error("grid of '{scene}' is not aligned with the analysis grid")]
    GridMismatch { scene: String },

    /// Raster payload length does not match its grid.
    #[error("band '{band}' holds {actual} samples, grid expects {expected}")]
    BandSize {
        band: String,
        expected: usize,
        actual: usize,
    },

    /// Band file length does not match its grid and sample type.
    #[error("band file {path} holds {actual} bytes, grid expects {expected}")]
    BandFileSize {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// The fire perimeter could not be built.
    #[error("fire perimeter: {0}")]
    Perimeter(String),

    /// A referenced scene id is unknown to the catalog.
    #[error("scene '{0}' not found in catalog")]
    UnknownScene(String),

    /// Reading or writing a file failed.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SeverityError {
    /// Wrap an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
