//! Normalized Burn Ratio and its pre/post difference
//!
//! NBR contrasts near-infrared (high over healthy vegetation) with short-wave
//! infrared (high over dry, burned surfaces):
//!
//! ```text
//! NBR  = (NIR - SWIR2) / (NIR + SWIR2)
//! dNBR = NBR_pre - NBR_post
//! ```
//!
//! Positive dNBR means vegetation loss; negative dNBR means regrowth.

use crate::error::Result;
use crate::grid::{FirePerimeter, Raster};
use crate::imagery::Composite;

/// `(a - b) / (a + b)`, or `None` when the sum is zero.
#[inline]
pub fn normalized_difference(a: f32, b: f32) -> Option<f32> {
    let sum = a + b;
    if sum == 0.0 {
        return None;
    }
    Some((a - b) / sum)
}

/// NBR of a composite from its NIR and SWIR2 bands.
///
/// # Errors
/// Returns an error if either band is missing from the composite.
pub fn nbr(composite: &Composite, nir_band: &str, swir2_band: &str) -> Result<Raster<f32>> {
    let nir = composite.band(nir_band)?;
    let swir2 = composite.band(swir2_band)?;
    nir.zip_with(swir2, "NBR", normalized_difference)
}

/// dNBR from pre- and post-fire NBR, clipped to the perimeter.
///
/// # Errors
/// Returns an error if the two rasters are on different grids.
pub fn dnbr(
    nbr_pre: &Raster<f32>,
    nbr_post: &Raster<f32>,
    perimeter: &FirePerimeter,
) -> Result<Raster<f32>> {
    let diff = nbr_pre.zip_with(nbr_post, "dNBR", |pre, post| Some(pre - post))?;
    Ok(diff.clip(perimeter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridSpec, Polygon};
    use crate::imagery::{Scene, SceneMetadata, BAND_NIR, BAND_SWIR2};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use nalgebra::Point2;

    #[test]
    fn test_normalized_difference_definition() {
        assert_relative_eq!(normalized_difference(0.4, 0.1).unwrap(), 0.6, epsilon = 1e-6);
        assert_relative_eq!(normalized_difference(3000.0, 1000.0).unwrap(), 0.5);
        assert_relative_eq!(normalized_difference(0.0, 5.0).unwrap(), -1.0);
        assert_eq!(normalized_difference(0.0, 0.0), None);
    }

    fn composite(nir: Vec<u16>, swir2: Vec<u16>) -> Composite {
        let grid = GridSpec::projected(nir.len(), 1, 0.0, 10.0, 10.0);
        let scene = Scene::new(SceneMetadata {
            id: "c".to_string(),
            acquired: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            cloudy_pixel_percentage: 0.0,
            grid,
        })
        .with_band(BAND_NIR, Raster::from_values("B8", grid, nir).unwrap())
        .unwrap()
        .with_band(BAND_SWIR2, Raster::from_values("B12", grid, swir2).unwrap())
        .unwrap();
        Composite::median("test", &[scene], &[BAND_NIR, BAND_SWIR2]).unwrap()
    }

    #[test]
    fn test_nbr_masks_zero_denominator() {
        let c = composite(vec![3000, 0, 1000], vec![1000, 0, 3000]);
        let n = nbr(&c, BAND_NIR, BAND_SWIR2).unwrap();
        assert_relative_eq!(n.at(0).unwrap(), 0.5);
        assert_eq!(n.at(1), None);
        assert_relative_eq!(n.at(2).unwrap(), -0.5);
    }

    #[test]
    fn test_dnbr_is_pre_minus_post_and_clipped() {
        let pre = composite(vec![3000, 3000, 3000], vec![1000, 1000, 1000]);
        let post = composite(vec![1000, 2000, 3000], vec![3000, 1000, 1000]);
        let nbr_pre = nbr(&pre, BAND_NIR, BAND_SWIR2).unwrap();
        let nbr_post = nbr(&post, BAND_NIR, BAND_SWIR2).unwrap();
        // Drops the last pixel (centre x = 25)
        let perimeter = FirePerimeter::new(vec![Polygon::rectangle(
            Point2::new(0.0, 0.0),
            Point2::new(20.0, 10.0),
        )])
        .unwrap();
        let d = dnbr(&nbr_pre, &nbr_post, &perimeter).unwrap();
        assert_relative_eq!(d.at(0).unwrap(), 1.0);
        assert_relative_eq!(d.at(1).unwrap(), 0.5 - 1.0 / 3.0, epsilon = 1e-6);
        assert_eq!(d.at(2), None);
    }
}
