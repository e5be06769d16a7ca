//! Scene catalog interface
//!
//! The catalog stands in for a hosted imagery archive. Queries are built the
//! way archive filters are chained (bounds, then dates, then a metadata
//! threshold) and are evaluated against metadata only, so a catalog can defer
//! reading pixels until a scene is known to be needed.

use tracing::debug;

use super::scene::{Scene, SceneMetadata};
use crate::core_types::DateWindow;
use crate::error::{Result, SeverityError};
use crate::grid::Bounds;

/// Filter over scene metadata
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneQuery {
    bounds: Option<Bounds>,
    window: Option<DateWindow>,
    max_cloudy_pixel_percentage: Option<f32>,
}

impl SceneQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep scenes whose footprint intersects `bounds`.
    pub fn filter_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Keep scenes acquired inside `window` (start inclusive, end exclusive).
    pub fn filter_date(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Keep scenes whose cloudy pixel percentage is at most `max` (inclusive).
    pub fn max_cloudy_pixel_percentage(mut self, max: f32) -> Self {
        self.max_cloudy_pixel_percentage = Some(max);
        self
    }

    /// Whether a scene passes every configured filter.
    pub fn matches(&self, meta: &SceneMetadata) -> bool {
        let in_bounds = self
            .bounds
            .is_none_or(|b| b.intersects(&meta.footprint()));
        let in_window = self.window.is_none_or(|w| w.contains(meta.acquired));
        let clear_enough = self
            .max_cloudy_pixel_percentage
            .is_none_or(|max| meta.cloudy_pixel_percentage <= max);
        in_bounds && in_window && clear_enough
    }
}

/// Source of scenes for compositing
pub trait SceneCatalog: Send + Sync {
    /// Metadata of every scene in the catalog.
    ///
    /// # Errors
    /// Returns an error if the catalog index cannot be read.
    fn list(&self) -> Result<Vec<SceneMetadata>>;

    /// Load a scene's bands.
    ///
    /// # Errors
    /// Returns an error if the scene is unknown or its bands cannot be read.
    fn load(&self, id: &str) -> Result<Scene>;

    /// Load every scene matching `query`, in acquisition order.
    ///
    /// # Errors
    /// Propagates listing and loading errors.
    fn query(&self, query: &SceneQuery) -> Result<Vec<Scene>> {
        let mut selected: Vec<SceneMetadata> = self
            .list()?
            .into_iter()
            .filter(|m| query.matches(m))
            .collect();
        selected.sort_by(|a, b| a.acquired.cmp(&b.acquired).then_with(|| a.id.cmp(&b.id)));
        debug!(matched = selected.len(), "catalog query");
        selected.iter().map(|m| self.load(&m.id)).collect()
    }
}

/// Catalog holding fully loaded scenes in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    scenes: Vec<Scene>,
}

impl InMemoryCatalog {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl SceneCatalog for InMemoryCatalog {
    fn list(&self) -> Result<Vec<SceneMetadata>> {
        Ok(self.scenes.iter().map(|s| s.metadata().clone()).collect())
    }

    fn load(&self, id: &str) -> Result<Scene> {
        self.scenes
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or_else(|| SeverityError::UnknownScene(id.to_string()))
    }
}
