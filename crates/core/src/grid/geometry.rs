//! Raster grid geometry
//!
//! A [`GridSpec`] places a row-major pixel array on the ground: the upper-left
//! corner, the signed pixel size along each axis, and whether coordinates are
//! projected meters or geographic degrees. Every raster in one analysis shares
//! a single aligned grid.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::core_types::SquareMeters;

/// Mean Earth radius used for geographic pixel areas (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Units of the grid's coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateUnits {
    /// Projected CRS in meters (e.g. UTM)
    #[default]
    Projected,
    /// Longitude/latitude in degrees
    Geographic,
}

/// Axis-aligned bounding box in CRS coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, p| b.expand_to(p),
        ))
    }

    /// Grow the box to include `p`.
    #[must_use]
    pub fn expand_to(self, p: &Point2<f64>) -> Self {
        Bounds {
            min: Point2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(self, other: &Bounds) -> Self {
        self.expand_to(&other.min).expand_to(&other.max)
    }

    /// Whether the two boxes overlap (touching edges count).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Whether `p` lies inside or on the box.
    #[inline]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Placement and shape of a raster grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel size along X (positive)
    pub pixel_width: f64,
    /// Pixel size along Y (negative for north-up rasters)
    pub pixel_height: f64,
    #[serde(default)]
    pub units: CoordinateUnits,
}

impl GridSpec {
    /// North-up projected grid with square pixels.
    pub fn projected(
        width: usize,
        height: usize,
        origin_x: f64,
        origin_y: f64,
        pixel: f64,
    ) -> Self {
        Self {
            width,
            height,
            origin_x,
            origin_y,
            pixel_width: pixel,
            pixel_height: -pixel,
            units: CoordinateUnits::Projected,
        }
    }

    /// Check dimensions and pixel sizes are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("grid is empty ({}x{})", self.width, self.height));
        }
        for (name, v) in [
            ("origin_x", self.origin_x),
            ("origin_y", self.origin_y),
            ("pixel_width", self.pixel_width),
            ("pixel_height", self.pixel_height),
        ] {
            if !v.is_finite() {
                return Err(format!("{name} must be finite, got {v}"));
            }
        }
        if self.pixel_width == 0.0 || self.pixel_height == 0.0 {
            return Err("pixel size must be non-zero".to_string());
        }
        Ok(())
    }

    /// Number of pixels
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// True when the grid has no pixels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major index of `(col, row)`
    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// `(col, row)` of a row-major index
    #[inline]
    pub fn col_row(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// CRS coordinate of the centre of pixel `(col, row)`
    #[inline]
    pub fn pixel_center(&self, col: usize, row: usize) -> Point2<f64> {
        Point2::new(
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Bounding box of the whole grid
    pub fn bounds(&self) -> Bounds {
        let far_x = self.origin_x + self.width as f64 * self.pixel_width;
        let far_y = self.origin_y + self.height as f64 * self.pixel_height;
        Bounds {
            min: Point2::new(self.origin_x.min(far_x), self.origin_y.min(far_y)),
            max: Point2::new(self.origin_x.max(far_x), self.origin_y.max(far_y)),
        }
    }

    /// Whether two grids line up pixel-for-pixel
    pub fn is_aligned_with(&self, other: &GridSpec) -> bool {
        self == other
    }

    /// Ground area of one pixel in `row`.
    ///
    /// Projected grids have constant pixel area. Geographic pixels shrink
    /// towards the poles; their area is the spherical cell
    /// `R² · Δλ · |sin φ₁ − sin φ₂|`.
    pub fn pixel_area(&self, row: usize) -> SquareMeters {
        match self.units {
            CoordinateUnits::Projected => {
                SquareMeters::new((self.pixel_width * self.pixel_height).abs())
            }
            CoordinateUnits::Geographic => {
                let top = self.origin_y + row as f64 * self.pixel_height;
                let bottom = top + self.pixel_height;
                let d_lon = self.pixel_width.abs().to_radians();
                let band = (top.to_radians().sin() - bottom.to_radians().sin()).abs();
                SquareMeters::new(EARTH_RADIUS_M * EARTH_RADIUS_M * d_lon * band)
            }
        }
    }
}
