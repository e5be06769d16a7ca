//! Raster grids, masked bands and the fire perimeter

pub mod geometry;
pub mod perimeter;
pub mod raster;

// Re-export main types
pub use geometry::*;
pub use perimeter::*;
pub use raster::*;
