//! Scene catalog backed by a JSON manifest and raw band files
//!
//! The manifest lists scene metadata and, per band, a path to a headerless
//! row-major sample file relative to the manifest. `u16` samples are
//! little-endian. Only scenes selected by a query have their bands read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::catalog::SceneCatalog;
use super::scene::{Scene, SceneMetadata};
use crate::error::{Result, SeverityError};
use crate::grid::Raster;

/// Sample encoding of a band file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// One byte per pixel
    U8,
    /// Two bytes per pixel, little-endian
    #[default]
    U16,
}

impl SampleType {
    /// Bytes per pixel
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }
}

/// Location and encoding of one band file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSource {
    pub path: PathBuf,
    #[serde(default)]
    pub dtype: SampleType,
}

/// One scene entry in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestScene {
    #[serde(flatten)]
    pub metadata: SceneMetadata,
    pub bands: BTreeMap<String, BandSource>,
}

/// Top-level manifest document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub scenes: Vec<ManifestScene>,
}

/// Catalog reading scenes listed in a manifest file
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    root: PathBuf,
    manifest: Manifest,
}

impl ManifestCatalog {
    /// Open a manifest; band paths resolve against its directory.
    ///
    /// # Errors
    /// Returns an error if the manifest cannot be read, parsed, or lists an
    /// invalid grid or duplicate scene id.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SeverityError::io(path, e))?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let catalog = Self::from_manifest(root, manifest)?;
        info!(
            scenes = catalog.manifest.scenes.len(),
            manifest = %path.display(),
            "opened scene manifest"
        );
        Ok(catalog)
    }

    /// Catalog over an in-memory manifest rooted at `root`.
    ///
    /// # Errors
    /// Returns an error on invalid grids or duplicate scene ids.
    pub fn from_manifest(root: PathBuf, manifest: Manifest) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &manifest.scenes {
            let meta = &entry.metadata;
            meta.grid.validate().map_err(|msg| {
                SeverityError::InvalidConfig(format!("scene '{}': {msg}", meta.id))
            })?;
            if !seen.insert(meta.id.as_str()) {
                return Err(SeverityError::InvalidConfig(format!(
                    "duplicate scene id '{}'",
                    meta.id
                )));
            }
        }
        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn read_band(
        &self,
        name: &str,
        source: &BandSource,
        meta: &SceneMetadata,
    ) -> Result<Raster<u16>> {
        let path = self.root.join(&source.path);
        let bytes = std::fs::read(&path).map_err(|e| SeverityError::io(&path, e))?;
        let expected = meta.grid.len() * source.dtype.size();
        if bytes.len() != expected {
            return Err(SeverityError::BandFileSize {
                path,
                expected,
                actual: bytes.len(),
            });
        }
        let values = decode_samples(&bytes, source.dtype);
        debug!(scene = %meta.id, band = name, path = %path.display(), "read band");
        Raster::from_values(name, meta.grid, values)
    }
}

impl SceneCatalog for ManifestCatalog {
    fn list(&self) -> Result<Vec<SceneMetadata>> {
        Ok(self
            .manifest
            .scenes
            .iter()
            .map(|s| s.metadata.clone())
            .collect())
    }

    fn load(&self, id: &str) -> Result<Scene> {
        let entry = self
            .manifest
            .scenes
            .iter()
            .find(|s| s.metadata.id == id)
            .ok_or_else(|| SeverityError::UnknownScene(id.to_string()))?;
        entry
            .bands
            .iter()
            .try_fold(Scene::new(entry.metadata.clone()), |scene, (name, source)| {
                let raster = self.read_band(name, source, &entry.metadata)?;
                scene.with_band(name.clone(), raster)
            })
    }
}

/// Write `scenes` as band files plus `manifest.json` under `dir`.
///
/// Bands whose values all fit in a byte are stored as `u8`. Masked cells are
/// written as 0. Returns the manifest path.
///
/// # Errors
/// Returns an error if any file cannot be written.
pub fn write_manifest(dir: &Path, scenes: &[Scene]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| SeverityError::io(dir, e))?;
    let mut manifest = Manifest::default();
    for scene in scenes {
        let mut bands = BTreeMap::new();
        for name in scene.band_names() {
            let values: Vec<u16> = scene
                .band(name)?
                .cells()
                .iter()
                .map(|c| c.unwrap_or(0))
                .collect();
            let dtype = if values.iter().all(|&v| v <= u16::from(u8::MAX)) {
                SampleType::U8
            } else {
                SampleType::U16
            };
            let file = PathBuf::from(format!("{}_{name}.{}", scene.id(), dtype_extension(dtype)));
            let path = dir.join(&file);
            std::fs::write(&path, encode_samples(&values, dtype))
                .map_err(|e| SeverityError::io(&path, e))?;
            bands.insert(name.to_string(), BandSource { path: file, dtype });
        }
        manifest.scenes.push(ManifestScene {
            metadata: scene.metadata().clone(),
            bands,
        });
    }
    let path = dir.join("manifest.json");
    let text = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&path, text).map_err(|e| SeverityError::io(&path, e))?;
    info!(path = %path.display(), scenes = manifest.scenes.len(), "wrote scene manifest");
    Ok(path)
}

fn dtype_extension(dtype: SampleType) -> &'static str {
    match dtype {
        SampleType::U8 => "u8",
        SampleType::U16 => "u16",
    }
}

/// Decode raw samples into `u16` values.
pub fn decode_samples(bytes: &[u8], dtype: SampleType) -> Vec<u16> {
    match dtype {
        SampleType::U8 => bytes.iter().map(|&b| u16::from(b)).collect(),
        SampleType::U16 => bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
    }
}

/// Encode `u16` values as raw samples; `U8` saturates at 255.
pub fn encode_samples(values: &[u16], dtype: SampleType) -> Vec<u8> {
    match dtype {
        SampleType::U8 => values.iter().map(|&v| v.min(255) as u8).collect(),
        SampleType::U16 => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridSpec;
    use crate::imagery::catalog::SceneQuery;
    use chrono::NaiveDate;

    fn write_scene(dir: &Path) -> Manifest {
        let grid = GridSpec::projected(2, 2, 0.0, 20.0, 10.0);
        std::fs::write(
            dir.join("b8.u16"),
            encode_samples(&[3000, 3100, 3200, 3300], SampleType::U16),
        )
        .unwrap();
        std::fs::write(dir.join("scl.u8"), [4u8, 4, 9, 4]).unwrap();
        let mut bands = BTreeMap::new();
        bands.insert(
            "B8".to_string(),
            BandSource {
                path: "b8.u16".into(),
                dtype: SampleType::U16,
            },
        );
        bands.insert(
            "SCL".to_string(),
            BandSource {
                path: "scl.u8".into(),
                dtype: SampleType::U8,
            },
        );
        Manifest {
            scenes: vec![ManifestScene {
                metadata: SceneMetadata {
                    id: "S2B_20240401".to_string(),
                    acquired: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    cloudy_pixel_percentage: 7.5,
                    grid,
                },
                bands,
            }],
        }
    }

    #[test]
    fn test_open_and_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_scene(dir.path());
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();

        let catalog = ManifestCatalog::open(&path).unwrap();
        let scenes = catalog.query(&SceneQuery::new()).unwrap();
        assert_eq!(scenes.len(), 1);
        let scene = &scenes[0];
        assert_eq!(scene.band("B8").unwrap().get(1, 1), Some(3300));
        assert_eq!(scene.band("SCL").unwrap().get(0, 1), Some(9));
    }

    #[test]
    fn test_manifest_json_shape() {
        let text = r#"{
            "scenes": [{
                "id": "a",
                "acquired": "2024-04-01",
                "cloudy_pixel_percentage": 4.2,
                "grid": {"width": 2, "height": 2, "origin_x": 0.0, "origin_y": 20.0,
                         "pixel_width": 10.0, "pixel_height": -10.0, "units": "projected"},
                "bands": {"B8": {"path": "b8.u16"}, "SCL": {"path": "scl.u8", "dtype": "u8"}}
            }]
        }"#;
        let manifest: Manifest = serde_json::from_str(text).unwrap();
        let scene = &manifest.scenes[0];
        assert_eq!(scene.bands["B8"].dtype, SampleType::U16);
        assert_eq!(scene.bands["SCL"].dtype, SampleType::U8);
        assert_eq!(scene.metadata.grid.width, 2);
    }

    #[test]
    fn test_short_band_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_scene(dir.path());
        std::fs::write(dir.path().join("b8.u16"), [0u8; 6]).unwrap();
        let catalog = ManifestCatalog::from_manifest(dir.path().to_path_buf(), manifest).unwrap();
        assert!(matches!(
            catalog.load("S2B_20240401"),
            Err(SeverityError::BandFileSize {
                expected: 8,
                actual: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_odd_length_band_file_reports_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_scene(dir.path());
        std::fs::write(dir.path().join("b8.u16"), [0u8; 7]).unwrap();
        let catalog = ManifestCatalog::from_manifest(dir.path().to_path_buf(), manifest).unwrap();
        let err = catalog.load("S2B_20240401").unwrap_err();
        assert!(matches!(
            err,
            SeverityError::BandFileSize {
                expected: 8,
                actual: 7,
                ..
            }
        ));
        assert!(err.to_string().contains("7 bytes"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = write_scene(dir.path());
        manifest.scenes.push(manifest.scenes[0].clone());
        assert!(ManifestCatalog::from_manifest(dir.path().to_path_buf(), manifest).is_err());
    }

    #[test]
    fn test_sample_codec() {
        let bytes = encode_samples(&[1, 513, 65535], SampleType::U16);
        assert_eq!(bytes, vec![1, 0, 1, 2, 255, 255]);
        assert_eq!(decode_samples(&bytes, SampleType::U16), vec![1, 513, 65535]);
        assert_eq!(encode_samples(&[7, 300], SampleType::U8), vec![7, 255]);
    }

    #[test]
    fn test_write_manifest_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let grid = GridSpec::projected(2, 1, 0.0, 10.0, 10.0);
        let scene = Scene::new(SceneMetadata {
            id: "S2A_20240520".to_string(),
            acquired: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            cloudy_pixel_percentage: 3.0,
            grid,
        })
        .with_band("B12", Raster::from_values("B12", grid, vec![900, 1200]).unwrap())
        .unwrap()
        .with_band("SCL", Raster::from_values("SCL", grid, vec![4, 8]).unwrap())
        .unwrap();

        let path = write_manifest(dir.path(), std::slice::from_ref(&scene)).unwrap();
        let catalog = ManifestCatalog::open(&path).unwrap();
        let entry = &catalog.manifest().scenes[0];
        assert_eq!(entry.bands["B12"].dtype, SampleType::U16);
        assert_eq!(entry.bands["SCL"].dtype, SampleType::U8);
        assert_eq!(catalog.load("S2A_20240520").unwrap(), scene);
    }
}
