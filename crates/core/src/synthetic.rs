//! Synthetic fire scenes
//!
//! Builds a small but realistic scene collection without any imagery on
//! disk: a circular burn scar whose severity falls off from the centre, a
//! thin regrowth ring at the scar edge, sensor noise, and random cloud
//! patches flagged in the classification band. One extra post-fire scene is
//! mostly cloud and carries a high cloudy pixel percentage, so it must be
//! dropped by the catalog filter.
//!
//! Generation is fully determined by the seed.

use chrono::{NaiveDate, TimeDelta};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use crate::config::AnalysisConfig;
use crate::error::{Result, SeverityError};
use crate::grid::{FirePerimeter, GridSpec, Polygon, Raster};
use crate::imagery::{
    InMemoryCatalog, Scene, SceneMetadata, SclClass, BAND_NIR, BAND_SCL, BAND_SWIR2,
};

/// Sum of NIR and SWIR2 digital numbers for clear pixels
const BAND_SUM: f64 = 4000.0;
/// Pre-fire NBR of healthy vegetation
const HEALTHY_NBR: f64 = 0.6;
/// dNBR at the scar centre
const PEAK_DNBR: f64 = 0.85;
/// dNBR of the regrowth ring
const REGROWTH_DNBR: f64 = -0.35;
/// Inner edge of the regrowth ring as a fraction of the scar radius
const RING_START: f64 = 0.85;
/// Number of vertices of the perimeter polygon
const PERIMETER_VERTICES: usize = 96;

/// Parameters of a synthetic fire
#[derive(Debug, Clone)]
pub struct SyntheticFire {
    pub seed: u64,
    /// Grid width and height in pixels
    pub size: usize,
    /// Pixel size in meters
    pub pixel: f64,
    pub pre_scenes: usize,
    pub post_scenes: usize,
    /// Chance that a scene carries a cloud patch
    pub cloud_probability: f64,
    /// Standard spread of NBR noise
    pub noise: f64,
}

impl Default for SyntheticFire {
    fn default() -> Self {
        Self {
            seed: 42,
            size: 128,
            pixel: 10.0,
            pre_scenes: 5,
            post_scenes: 7,
            cloud_probability: 0.6,
            noise: 0.02,
        }
    }
}

/// Generated scenes and the perimeter they burn
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    pub catalog: InMemoryCatalog,
    pub perimeter: FirePerimeter,
    pub grid: GridSpec,
    /// Scar centre in CRS coordinates
    pub centre: Point2<f64>,
    /// Scar radius in meters
    pub radius: f64,
}

impl SyntheticFire {
    /// Generate scenes for the windows in `config`.
    ///
    /// # Errors
    /// Returns an error if the grid is too small or the config windows are invalid.
    pub fn generate(&self, config: &AnalysisConfig) -> Result<SyntheticScenario> {
        if self.size < 8 {
            return Err(SeverityError::InvalidConfig(format!(
                "synthetic grid needs at least 8 pixels per side, got {}",
                self.size
            )));
        }
        let pre_window = config.pre_fire_window()?;
        let post_window = config.post_fire_window()?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let grid = GridSpec::projected(self.size, self.size, 500_000.0, 4_200_000.0, self.pixel);
        let extent = self.size as f64 * self.pixel;
        let centre = Point2::new(grid.origin_x + extent / 2.0, grid.origin_y - extent / 2.0);
        let radius = extent * 0.35;
        let perimeter = FirePerimeter::new(vec![circle(centre, radius)])?;

        let mut catalog = InMemoryCatalog::default();
        for i in 0..self.pre_scenes {
            let date = spread_date(pre_window.start, pre_window.days(), i, self.pre_scenes);
            let scene = self.scene(&mut rng, &grid, format!("PRE_{i:02}"), date, |_| 0.0)?;
            catalog.push(scene);
        }
        let scar = |p: Point2<f64>| burn_dnbr((p - centre).norm() / radius);
        for i in 0..self.post_scenes {
            let date = spread_date(post_window.start, post_window.days(), i, self.post_scenes);
            let scene = self.scene(&mut rng, &grid, format!("POST_{i:02}"), date, scar)?;
            catalog.push(scene);
        }
        catalog.push(overcast_scene(&grid, post_window.start)?);

        Ok(SyntheticScenario {
            catalog,
            perimeter,
            grid,
            centre,
            radius,
        })
    }

    fn scene(
        &self,
        rng: &mut StdRng,
        grid: &GridSpec,
        id: String,
        acquired: NaiveDate,
        dnbr_at: impl Fn(Point2<f64>) -> f64,
    ) -> Result<Scene> {
        let extent = grid.width as f64 * self.pixel;
        let cloud = (rng.random::<f64>() < self.cloud_probability).then(|| {
            let c = Point2::new(
                grid.origin_x + rng.random_range(0.0..extent),
                grid.origin_y - rng.random_range(0.0..extent),
            );
            (c, rng.random_range(0.08..0.2) * extent)
        });

        let n = grid.len();
        let mut nir = Vec::with_capacity(n);
        let mut swir2 = Vec::with_capacity(n);
        let mut scl = Vec::with_capacity(n);
        let mut cloudy = 0usize;
        for idx in 0..n {
            let (col, row) = grid.col_row(idx);
            let p = grid.pixel_center(col, row);
            if cloud.is_some_and(|(c, r)| (p - c).norm() < r) {
                cloudy += 1;
                nir.push(7000);
                swir2.push(6500);
                scl.push(u16::from(SclClass::CloudHigh.code()));
                continue;
            }
            let d = dnbr_at(p);
            let noise = rng.random_range(-self.noise..=self.noise);
            let value = (HEALTHY_NBR - d + noise).clamp(-0.99, 0.99);
            let (b8, b12) = bands_for_nbr(value);
            nir.push(b8);
            swir2.push(b12);
            let class = if d > 0.1 {
                SclClass::BareSoil
            } else {
                SclClass::Vegetation
            };
            scl.push(u16::from(class.code()));
        }

        let meta = SceneMetadata {
            id,
            acquired,
            cloudy_pixel_percentage: (cloudy as f64 / n as f64 * 100.0) as f32,
            grid: *grid,
        };
        Scene::new(meta)
            .with_band(BAND_NIR, Raster::from_values(BAND_NIR, *grid, nir)?)?
            .with_band(BAND_SWIR2, Raster::from_values(BAND_SWIR2, *grid, swir2)?)?
            .with_band(BAND_SCL, Raster::from_values(BAND_SCL, *grid, scl)?)
    }
}

/// dNBR of the synthetic scar at a normalized distance from its centre
fn burn_dnbr(r: f64) -> f64 {
    if r >= 1.0 {
        0.0
    } else if r >= RING_START {
        REGROWTH_DNBR
    } else {
        let t = r / RING_START;
        PEAK_DNBR * (1.0 - t * t)
    }
}

/// NIR and SWIR2 digital numbers producing `nbr` with a fixed band sum
fn bands_for_nbr(nbr: f64) -> (u16, u16) {
    let nir = BAND_SUM * (1.0 + nbr) / 2.0;
    let swir2 = BAND_SUM - nir;
    (nir.round() as u16, swir2.round() as u16)
}

fn spread_date(start: NaiveDate, days: i64, i: usize, count: usize) -> NaiveDate {
    let offset = (days * i as i64) / count.max(1) as i64;
    start + TimeDelta::days(offset)
}

fn circle(centre: Point2<f64>, radius: f64) -> Polygon {
    let ring = (0..PERIMETER_VERTICES)
        .map(|k| {
            let a = TAU * k as f64 / PERIMETER_VERTICES as f64;
            Point2::new(centre.x + radius * a.cos(), centre.y + radius * a.sin())
        })
        .collect();
    // A regular polygon with finite vertices always has a valid ring
    Polygon::new(ring, Vec::new()).unwrap_or_else(|_| {
        Polygon::rectangle(
            Point2::new(centre.x - radius, centre.y - radius),
            Point2::new(centre.x + radius, centre.y + radius),
        )
    })
}

/// Heavily overcast scene that would wreck the composite if not filtered
fn overcast_scene(grid: &GridSpec, acquired: NaiveDate) -> Result<Scene> {
    let meta = SceneMetadata {
        id: "POST_OVERCAST".to_string(),
        acquired,
        cloudy_pixel_percentage: 85.0,
        grid: *grid,
    };
    let (b8, b12) = bands_for_nbr(-0.5);
    Scene::new(meta)
        .with_band(BAND_NIR, Raster::filled(*grid, b8))?
        .with_band(BAND_SWIR2, Raster::filled(*grid, b12))?
        .with_band(BAND_SCL, Raster::filled(*grid, u16::from(SclClass::Vegetation.code())))
}
