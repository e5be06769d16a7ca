//! Writing analysis outputs
//!
//! - `severity_areas.csv`: one row per severity class
//! - `report.json`: the full [`SeverityReport`]
//! - raster products as headerless little-endian files plus `grid.json`:
//!   `f32` rasters use NaN for masked pixels, `severity.u8` uses 255;
//!   `severity_legend.json` maps class codes to labels, colours and dNBR ranges

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::{AreaSummary, SeverityClass};
use crate::error::{Result, SeverityError};
use crate::grid::Raster;
use crate::pipeline::{SeverityProducts, SeverityReport};

/// Masked value in exported severity rasters
pub const SEVERITY_NODATA: u8 = 255;

/// File name of the per-class area table
pub const AREA_CSV: &str = "severity_areas.csv";
/// File name of the JSON report
pub const REPORT_JSON: &str = "report.json";

/// One class of the severity raster legend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub code: u8,
    pub label: &'static str,
    pub color: &'static str,
    /// Inclusive lower dNBR bound, `None` when unbounded
    pub dnbr_min: Option<f32>,
    /// Exclusive upper dNBR bound, `None` when unbounded
    pub dnbr_max: Option<f32>,
}

/// Legend for `severity.u8`, in class order
pub fn severity_legend() -> Vec<LegendEntry> {
    SeverityClass::ALL
        .iter()
        .map(|&class| {
            let (lo, hi) = class.dnbr_range();
            LegendEntry {
                code: class.code(),
                label: class.label(),
                color: class.color(),
                dnbr_min: lo.is_finite().then_some(lo),
                dnbr_max: hi.is_finite().then_some(hi),
            }
        })
        .collect()
}

/// Write the per-class area table as CSV.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_area_csv(path: &Path, summary: &AreaSummary) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in &summary.classes {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| SeverityError::io(path, e))?;
    Ok(())
}

/// Write the report as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_report_json(path: &Path, report: &SeverityReport) -> Result<()> {
    let file = File::create(path).map_err(|e| SeverityError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(|e| SeverityError::io(path, e))?;
    Ok(())
}

/// Encode an `f32` raster, NaN for masked pixels.
pub fn encode_f32(raster: &Raster<f32>) -> Vec<u8> {
    raster
        .cells()
        .iter()
        .flat_map(|c| c.unwrap_or(f32::NAN).to_le_bytes())
        .collect()
}

/// Encode a severity raster as class codes, [`SEVERITY_NODATA`] for masked pixels.
pub fn encode_severity(raster: &Raster<SeverityClass>) -> Vec<u8> {
    raster
        .cells()
        .iter()
        .map(|c| c.map_or(SEVERITY_NODATA, SeverityClass::code))
        .collect()
}

/// Write NBR, dNBR and severity rasters into `dir`.
///
/// Returns the paths written.
///
/// # Errors
/// Returns an error if the directory or any file cannot be written.
pub fn write_rasters(dir: &Path, products: &SeverityProducts) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| SeverityError::io(dir, e))?;
    let files = [
        ("nbr_pre.f32", encode_f32(&products.nbr_pre)),
        ("nbr_post.f32", encode_f32(&products.nbr_post)),
        ("dnbr.f32", encode_f32(&products.dnbr)),
        ("severity.u8", encode_severity(&products.severity)),
        (
            "grid.json",
            serde_json::to_vec_pretty(products.dnbr.grid())?,
        ),
        (
            "severity_legend.json",
            serde_json::to_vec_pretty(&severity_legend())?,
        ),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| SeverityError::io(&path, e))?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "wrote raster products");
    Ok(written)
}

/// Write the CSV table and JSON report into `dir`.
///
/// # Errors
/// Returns an error if the directory or either file cannot be written.
pub fn write_tables(dir: &Path, report: &SeverityReport) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| SeverityError::io(dir, e))?;
    write_area_csv(&dir.join(AREA_CSV), &report.areas)?;
    write_report_json(&dir.join(REPORT_JSON), report)?;
    info!(dir = %dir.display(), "wrote severity tables");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::class_areas;
    use crate::config::AnalysisConfig;
    use crate::grid::GridSpec;
    use crate::pipeline::BurnSeverityPipeline;
    use crate::synthetic::SyntheticFire;

    fn severity() -> Raster<SeverityClass> {
        let grid = GridSpec::projected(3, 1, 0.0, 10.0, 10.0);
        Raster::from_cells(
            "severity",
            grid,
            vec![
                Some(SeverityClass::HighSeverity),
                None,
                Some(SeverityClass::Unburned),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_area_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AREA_CSV);
        write_area_csv(&path, &class_areas(&severity())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "severity_class,severity_label,area_m2,area_km2,percent_of_fire"
        );
        assert_eq!(lines.len(), 9);
        assert!(lines[3].starts_with("2,Unburned,100.0,"));
        assert!(lines[7].starts_with("6,High Severity,100.0,"));
        assert!(lines[7].ends_with(",50.0"));
    }

    #[test]
    fn test_legend_covers_every_class() {
        let legend = severity_legend();
        assert_eq!(legend.len(), SeverityClass::COUNT);
        assert_eq!(legend[0].dnbr_min, None);
        assert_eq!(legend[0].dnbr_max, Some(-0.5));
        assert_eq!(legend[7].dnbr_min, Some(0.66));
        assert_eq!(legend[7].dnbr_max, None);
        assert_eq!(legend[2].color, "#FFFFCC");
    }

    #[test]
    fn test_severity_encoding_uses_nodata() {
        assert_eq!(encode_severity(&severity()), vec![6, SEVERITY_NODATA, 2]);
    }

    #[test]
    fn test_f32_encoding_uses_nan() {
        let grid = GridSpec::projected(2, 1, 0.0, 10.0, 10.0);
        let r = Raster::from_cells("d", grid, vec![Some(0.25f32), None]).unwrap();
        let bytes = encode_f32(&r);
        assert_eq!(bytes.len(), 8);
        assert_eq!(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 0.25);
        assert!(f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]).is_nan());
    }

    #[test]
    fn test_outputs_read_back() {
        let config = AnalysisConfig::default();
        let scenario = SyntheticFire {
            size: 32,
            ..SyntheticFire::default()
        }
        .generate(&config)
        .unwrap();
        let analysis = BurnSeverityPipeline::new(config)
            .unwrap()
            .run(&scenario.catalog, &scenario.perimeter)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), &analysis.report).unwrap();
        let written = write_rasters(dir.path(), &analysis.products).unwrap();
        assert_eq!(written.len(), 6);

        let text = std::fs::read_to_string(dir.path().join(REPORT_JSON)).unwrap();
        let report: SeverityReport = serde_json::from_str(&text).unwrap();
        assert_eq!(report, analysis.report);

        let grid = scenario.grid;
        for (name, sample) in [
            ("nbr_pre.f32", 4),
            ("nbr_post.f32", 4),
            ("dnbr.f32", 4),
            ("severity.u8", 1),
        ] {
            let len = std::fs::metadata(dir.path().join(name)).unwrap().len();
            assert_eq!(len, (grid.len() * sample) as u64, "{name}");
        }

        let text = std::fs::read_to_string(dir.path().join("grid.json")).unwrap();
        assert_eq!(serde_json::from_str::<GridSpec>(&text).unwrap(), grid);

        let text = std::fs::read_to_string(dir.path().join("severity_legend.json")).unwrap();
        let legend: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(legend.len(), SeverityClass::COUNT);
        assert_eq!(legend[7]["label"], "Extreme Severity");
        assert!(legend[7]["dnbr_max"].is_null());

        let csv_rows = std::fs::read_to_string(dir.path().join(AREA_CSV))
            .unwrap()
            .lines()
            .count();
        assert_eq!(csv_rows, SeverityClass::COUNT + 1);
    }
}
