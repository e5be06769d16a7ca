//! Masked single-band raster
//!
//! Stores one value per pixel in row-major order (`row * width + col`), with
//! `None` marking a masked pixel. Masks only ever grow: once a pixel is
//! masked by cloud screening, a zero denominator or the perimeter clip, no
//! later stage brings it back.
//!
//! Per-pixel transforms run row-parallel on rayon; results do not depend on
//! the number of worker threads.

use rayon::prelude::*;

use super::geometry::GridSpec;
use super::perimeter::FirePerimeter;
use crate::error::{Result, SeverityError};

/// A single raster band with a per-pixel validity mask
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    grid: GridSpec,
    cells: Vec<Option<T>>,
}

impl<T> Raster<T>
where
    T: Copy + Send + Sync,
{
    /// Raster with every pixel valid.
    ///
    /// # Errors
    /// Returns [`SeverityError::BandSize`] if `values` does not match the grid.
    pub fn from_values(name: &str, grid: GridSpec, values: Vec<T>) -> Result<Self> {
        check_len(name, &grid, values.len())?;
        Ok(Self {
            grid,
            cells: values.into_iter().map(Some).collect(),
        })
    }

    /// Raster from already-masked cells.
    ///
    /// # Errors
    /// Returns [`SeverityError::BandSize`] if `cells` does not match the grid.
    pub fn from_cells(name: &str, grid: GridSpec, cells: Vec<Option<T>>) -> Result<Self> {
        check_len(name, &grid, cells.len())?;
        Ok(Self { grid, cells })
    }

    /// Raster with every pixel masked.
    pub fn masked(grid: GridSpec) -> Self {
        Self {
            grid,
            cells: vec![None; grid.len()],
        }
    }

    /// Raster with every pixel set to `value`.
    pub fn filled(grid: GridSpec, value: T) -> Self {
        Self {
            grid,
            cells: vec![Some(value); grid.len()],
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn cells(&self) -> &[Option<T>] {
        &self.cells
    }

    /// Value at `(col, row)`, `None` if masked or out of range.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<T> {
        if col >= self.grid.width || row >= self.grid.height {
            return None;
        }
        self.cells[self.grid.index(col, row)]
    }

    /// Value at a row-major index, `None` if masked or out of range.
    #[inline]
    pub fn at(&self, index: usize) -> Option<T> {
        self.cells.get(index).copied().flatten()
    }

    /// One row of cells.
    pub fn row(&self, row: usize) -> &[Option<T>] {
        let w = self.grid.width;
        &self.cells[row * w..(row + 1) * w]
    }

    /// Number of unmasked pixels.
    pub fn valid_count(&self) -> usize {
        self.cells.par_iter().filter(|c| c.is_some()).count()
    }

    /// Apply `f` to every valid pixel; `f` returning `None` masks the pixel.
    pub fn map<U, F>(&self, f: F) -> Raster<U>
    where
        U: Copy + Send + Sync,
        F: Fn(T) -> Option<U> + Sync + Send,
    {
        Raster {
            grid: self.grid,
            cells: self.cells.par_iter().map(|c| c.and_then(&f)).collect(),
        }
    }

    /// Combine two aligned rasters pixel by pixel.
    ///
    /// A pixel is valid in the output only if it is valid in both inputs and
    /// `f` returns `Some`.
    ///
    /// # Errors
    /// Returns [`SeverityError::GridMismatch`] if the grids differ.
    pub fn zip_with<U, V, F>(&self, other: &Raster<U>, label: &str, f: F) -> Result<Raster<V>>
    where
        U: Copy + Send + Sync,
        V: Copy + Send + Sync,
        F: Fn(T, U) -> Option<V> + Sync + Send,
    {
        if !self.grid.is_aligned_with(&other.grid) {
            return Err(SeverityError::GridMismatch {
                scene: label.to_string(),
            });
        }
        let cells = self
            .cells
            .par_iter()
            .zip(other.cells.par_iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => f(*a, *b),
                _ => None,
            })
            .collect();
        Ok(Raster {
            grid: self.grid,
            cells,
        })
    }

    /// Mask every pixel where `keep` is masked or false.
    ///
    /// # Errors
    /// Returns [`SeverityError::GridMismatch`] if the grids differ.
    pub fn update_mask(&self, keep: &Raster<bool>, label: &str) -> Result<Raster<T>> {
        self.zip_with(keep, label, |v, k| k.then_some(v))
    }

    /// Mask every pixel whose centre lies outside `perimeter`.
    pub fn clip(&self, perimeter: &FirePerimeter) -> Raster<T> {
        let grid = self.grid;
        let bounds = perimeter.bounds();
        let cells = self
            .cells
            .par_chunks(grid.width.max(1))
            .enumerate()
            .flat_map_iter(|(row, cells)| {
                cells.iter().enumerate().map(move |(col, c)| {
                    let value = (*c)?;
                    let centre = grid.pixel_center(col, row);
                    (bounds.contains(&centre) && perimeter.contains(&centre)).then_some(value)
                })
            })
            .collect();
        Raster { grid, cells }
    }
}

impl Raster<f32> {
    /// Minimum and maximum of valid, finite pixels.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.cells
            .par_iter()
            .filter_map(|c| c.filter(|v| v.is_finite()))
            .fold(
                || None,
                |acc: Option<(f32, f32)>, v| match acc {
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                    None => Some((v, v)),
                },
            )
            .reduce(
                || None,
                |a, b| match (a, b) {
                    (Some((al, ah)), Some((bl, bh))) => Some((al.min(bl), ah.max(bh))),
                    (x, None) | (None, x) => x,
                },
            )
    }
}

fn check_len(name: &str, grid: &GridSpec, actual: usize) -> Result<()> {
    if actual != grid.len() {
        return Err(SeverityError::BandSize {
            band: name.to_string(),
            expected: grid.len(),
            actual,
        });
    }
    Ok(())
}
