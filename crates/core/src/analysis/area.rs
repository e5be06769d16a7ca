//! Burned area per severity class
//!
//! Zonal sum of pixel area over the classified raster. Every class gets a
//! row, even when no pixel falls in it, so downstream tables always have the
//! same eight entries in class order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::severity::SeverityClass;
use crate::core_types::{Percent, SquareKilometers, SquareMeters};
use crate::grid::Raster;

/// Area statistics for one severity class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassArea {
    pub severity_class: u8,
    pub severity_label: String,
    pub area_m2: SquareMeters,
    pub area_km2: SquareKilometers,
    pub percent_of_fire: Percent,
}

/// Per-class areas and the fire total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub classes: Vec<ClassArea>,
    pub total_area_km2: SquareKilometers,
}

impl AreaSummary {
    /// Row for `class`
    pub fn class(&self, class: SeverityClass) -> &ClassArea {
        &self.classes[class.index()]
    }

    /// Area of classes at or above `class` (e.g. everything burned at low
    /// severity or worse)
    pub fn area_at_least(&self, class: SeverityClass) -> SquareKilometers {
        self.classes[class.index()..]
            .iter()
            .map(|c| c.area_km2)
            .sum()
    }
}

/// Sum pixel area per class.
///
/// Rows are reduced in parallel and combined in row order so totals are the
/// same on any thread count.
pub fn class_areas(severity: &Raster<SeverityClass>) -> AreaSummary {
    let grid = *severity.grid();
    let per_row: Vec<[f64; SeverityClass::COUNT]> = (0..grid.height)
        .into_par_iter()
        .map(|row| {
            let pixel_area = *grid.pixel_area(row);
            let mut sums = [0.0; SeverityClass::COUNT];
            for class in severity.row(row).iter().flatten() {
                sums[class.index()] += pixel_area;
            }
            sums
        })
        .collect();

    let mut totals = [0.0; SeverityClass::COUNT];
    for row in &per_row {
        for (t, v) in totals.iter_mut().zip(row) {
            *t += v;
        }
    }

    let total_area_km2 = totals
        .iter()
        .copied()
        .map(SquareMeters::new)
        .sum::<SquareMeters>()
        .to_square_kilometers();

    let classes = SeverityClass::ALL
        .iter()
        .map(|&class| {
            let area_m2 = SquareMeters::new(totals[class.index()]);
            let area_km2 = area_m2.to_square_kilometers();
            ClassArea {
                severity_class: class.code(),
                severity_label: class.label().to_string(),
                area_m2,
                area_km2,
                percent_of_fire: area_km2.percent_of(total_area_km2),
            }
        })
        .collect();

    debug!(total_km2 = *total_area_km2, "class areas");
    AreaSummary {
        classes,
        total_area_km2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridSpec;
    use approx::assert_relative_eq;

    #[test]
    fn test_areas_percentages_and_labels() {
        use SeverityClass::{ExtremeSeverity, LowSeverity, Unburned};
        let grid = GridSpec::projected(4, 1, 0.0, 10.0, 10.0);
        let severity = Raster::from_cells(
            "severity",
            grid,
            vec![Some(Unburned), Some(LowSeverity), Some(LowSeverity), None],
        )
        .unwrap();

        let summary = class_areas(&severity);
        assert_eq!(summary.classes.len(), 8);
        assert_relative_eq!(*summary.total_area_km2, 300.0 / 1e6, epsilon = 1e-15);

        let low = summary.class(LowSeverity);
        assert_eq!(low.severity_class, 3);
        assert_eq!(low.severity_label, "Low Severity");
        assert_eq!(low.area_m2, SquareMeters::new(200.0));
        assert_relative_eq!(*low.percent_of_fire, 200.0 / 3.0, epsilon = 1e-9);

        let extreme = summary.class(ExtremeSeverity);
        assert_eq!(extreme.area_m2, SquareMeters::ZERO);
        assert_eq!(*extreme.percent_of_fire, 0.0);

        let pct: Percent = summary.classes.iter().map(|c| c.percent_of_fire).sum();
        assert_relative_eq!(*pct, 100.0, epsilon = 1e-9);
        assert_relative_eq!(*summary.area_at_least(LowSeverity), 200.0 / 1e6, epsilon = 1e-15);
    }

    #[test]
    fn test_empty_fire_reports_zero_percent() {
        let grid = GridSpec::projected(2, 2, 0.0, 20.0, 10.0);
        let summary = class_areas(&Raster::masked(grid));
        assert_eq!(*summary.total_area_km2, 0.0);
        assert!(summary.classes.iter().all(|c| *c.percent_of_fire == 0.0));
    }
}
