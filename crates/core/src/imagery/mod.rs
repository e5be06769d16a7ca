//! Scene access, cloud masking and compositing

pub mod catalog;
pub mod composite;
pub mod manifest;
pub mod scene;
pub mod scl;

pub use catalog::{InMemoryCatalog, SceneCatalog, SceneQuery};
pub use composite::{median, Composite};
pub use manifest::{
    write_manifest, BandSource, Manifest, ManifestCatalog, ManifestScene, SampleType,
};
pub use scene::{Scene, SceneMetadata, BAND_NIR, BAND_SCL, BAND_SWIR2};
pub use scl::{SclClass, SclMask, DEFAULT_VALID_SCL};
