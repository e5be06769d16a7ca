//! Fire perimeter geometry
//!
//! The perimeter is the union of every mapped burn polygon. Union is kept
//! implicit: a point is inside the perimeter when it is inside any member
//! polygon, which is all that clipping and zonal sums need.

use geojson::{GeoJson, Geometry, Value};
use nalgebra::Point2;
use std::path::Path;
use tracing::debug;

use super::geometry::Bounds;
use crate::error::{Result, SeverityError};

/// A polygon with one exterior ring and zero or more holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<Point2<f64>>,
    holes: Vec<Vec<Point2<f64>>>,
}

impl Polygon {
    /// Build a polygon from rings; a closing vertex equal to the first is optional.
    ///
    /// # Errors
    /// Returns [`SeverityError::Perimeter`] if a ring has fewer than three
    /// distinct vertices or a non-finite coordinate.
    pub fn new(exterior: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Result<Self> {
        let exterior = normalize_ring(exterior)?;
        let holes = holes
            .into_iter()
            .map(normalize_ring)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { exterior, holes })
    }

    /// Axis-aligned rectangle, handy for tests and synthetic scenes.
    pub fn rectangle(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self {
            exterior: vec![
                min,
                Point2::new(max.x, min.y),
                max,
                Point2::new(min.x, max.y),
            ],
            holes: Vec::new(),
        }
    }

    pub fn exterior(&self) -> &[Point2<f64>] {
        &self.exterior
    }

    pub fn holes(&self) -> &[Vec<Point2<f64>>] {
        &self.holes
    }

    /// Inside the exterior ring and outside every hole.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }
}

/// Union of burn polygons
#[derive(Debug, Clone, PartialEq)]
pub struct FirePerimeter {
    polygons: Vec<Polygon>,
    bounds: Bounds,
}

impl FirePerimeter {
    /// Union of the given polygons.
    ///
    /// # Errors
    /// Returns [`SeverityError::Perimeter`] if `polygons` is empty.
    pub fn new(polygons: Vec<Polygon>) -> Result<Self> {
        let bounds = polygons
            .iter()
            .filter_map(|p| Bounds::from_points(&p.exterior))
            .reduce(|a, b| a.union(&b))
            .ok_or_else(|| SeverityError::Perimeter("perimeter has no polygons".to_string()))?;
        Ok(Self { polygons, bounds })
    }

    /// Parse GeoJSON text, unioning every polygon found.
    ///
    /// Accepts bare geometries, features, feature collections and geometry
    /// collections. Point and line geometries carry no area and are skipped.
    ///
    /// # Errors
    /// Returns an error if the text is not GeoJSON or contains no polygon.
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let geojson: GeoJson = text.parse()?;
        let mut polygons = Vec::new();
        match geojson {
            GeoJson::Geometry(g) => collect_polygons(&g, &mut polygons)?,
            GeoJson::Feature(f) => {
                if let Some(g) = f.geometry {
                    collect_polygons(&g, &mut polygons)?;
                }
            }
            GeoJson::FeatureCollection(fc) => {
                for g in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                    collect_polygons(g, &mut polygons)?;
                }
            }
        }
        debug!(polygons = polygons.len(), "parsed fire perimeter");
        Self::new(polygons)
    }

    /// Read and parse a GeoJSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SeverityError::io(path, e))?;
        Self::from_geojson_str(&text)
    }

    /// Serialize as a GeoJSON `MultiPolygon` geometry with closed rings.
    pub fn to_geojson_string(&self) -> String {
        let polygons = self
            .polygons
            .iter()
            .map(|poly| {
                std::iter::once(&poly.exterior)
                    .chain(&poly.holes)
                    .map(|ring| closed_ring(ring))
                    .collect()
            })
            .collect();
        GeoJson::Geometry(Geometry::new(Value::MultiPolygon(polygons))).to_string()
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Bounding box of all exterior rings
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether `p` lies inside any member polygon.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        self.bounds.contains(p) && self.polygons.iter().any(|poly| poly.contains(p))
    }
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) -> Result<()> {
    match &geometry.value {
        Value::Polygon(rings) => out.push(polygon_from_rings(rings)?),
        Value::MultiPolygon(polys) => {
            for rings in polys {
                out.push(polygon_from_rings(rings)?);
            }
        }
        Value::GeometryCollection(members) => {
            for g in members {
                collect_polygons(g, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .map(|pos| match pos.as_slice() {
                [x, y, ..] => Ok(Point2::new(*x, *y)),
                _ => Err(SeverityError::Perimeter(format!(
                    "position needs two coordinates, got {}",
                    pos.len()
                ))),
            })
            .collect::<Result<Vec<_>>>()
    });
    let exterior = rings
        .next()
        .ok_or_else(|| SeverityError::Perimeter("polygon has no rings".to_string()))??;
    let holes = rings.collect::<Result<Vec<_>>>()?;
    Polygon::new(exterior, holes)
}

fn closed_ring(ring: &[Point2<f64>]) -> Vec<Vec<f64>> {
    ring.iter()
        .chain(ring.first())
        .map(|p| vec![p.x, p.y])
        .collect()
}

fn normalize_ring(mut ring: Vec<Point2<f64>>) -> Result<Vec<Point2<f64>>> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(SeverityError::Perimeter(format!(
            "ring needs at least 3 vertices, got {}",
            ring.len()
        )));
    }
    if ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(SeverityError::Perimeter(
            "ring has a non-finite coordinate".to_string(),
        ));
    }
    Ok(ring)
}

/// Even-odd ray casting test against one ring.
fn ring_contains(ring: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn test_polygon_with_hole() {
        let poly = Polygon::new(
            vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0), pt(0.0, 0.0)],
            vec![vec![pt(4.0, 4.0), pt(6.0, 4.0), pt(6.0, 6.0), pt(4.0, 6.0)]],
        )
        .unwrap();
        assert!(poly.contains(&pt(1.0, 1.0)));
        assert!(!poly.contains(&pt(5.0, 5.0)));
        assert!(!poly.contains(&pt(11.0, 5.0)));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening upwards
        let poly = Polygon::new(
            vec![
                pt(0.0, 0.0),
                pt(9.0, 0.0),
                pt(9.0, 9.0),
                pt(6.0, 9.0),
                pt(6.0, 3.0),
                pt(3.0, 3.0),
                pt(3.0, 9.0),
                pt(0.0, 9.0),
            ],
            Vec::new(),
        )
        .unwrap();
        assert!(poly.contains(&pt(1.5, 8.0)));
        assert!(poly.contains(&pt(7.5, 8.0)));
        assert!(!poly.contains(&pt(4.5, 8.0)));
        assert!(poly.contains(&pt(4.5, 1.0)));
    }

    #[test]
    fn test_union_of_disjoint_polygons() {
        let perimeter = FirePerimeter::new(vec![
            Polygon::rectangle(pt(0.0, 0.0), pt(10.0, 10.0)),
            Polygon::rectangle(pt(20.0, 0.0), pt(30.0, 10.0)),
        ])
        .unwrap();
        assert!(perimeter.contains(&pt(5.0, 5.0)));
        assert!(perimeter.contains(&pt(25.0, 5.0)));
        assert!(!perimeter.contains(&pt(15.0, 5.0)));
        assert_eq!(perimeter.bounds().max, pt(30.0, 10.0));
    }

    #[test]
    fn test_empty_perimeter_rejected() {
        assert!(FirePerimeter::new(Vec::new()).is_err());
    }

    #[test]
    fn test_degenerate_ring_rejected() {
        assert!(Polygon::new(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(0.0, 0.0)], Vec::new()).is_err());
    }

    #[test]
    fn test_feature_collection_union() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "east"},
                 "geometry": {"type": "Polygon",
                   "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon",
                   "coordinates": [[[[20,0],[30,0],[30,10],[20,10],[20,0]]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [50, 50]}}
            ]
        }"#;
        let perimeter = FirePerimeter::from_geojson_str(text).unwrap();
        assert_eq!(perimeter.polygons().len(), 2);
        assert!(perimeter.contains(&pt(25.0, 5.0)));
        assert!(!perimeter.contains(&pt(50.0, 50.0)));
    }

    #[test]
    fn test_geojson_without_polygons_rejected() {
        let text = r#"{"type": "Point", "coordinates": [1, 2]}"#;
        assert!(matches!(
            FirePerimeter::from_geojson_str(text),
            Err(SeverityError::Perimeter(_))
        ));
    }

    #[test]
    fn test_geojson_output_parses_back() {
        let poly = Polygon::new(
            vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)],
            vec![vec![pt(4.0, 4.0), pt(6.0, 4.0), pt(6.0, 6.0)]],
        )
        .unwrap();
        let perimeter = FirePerimeter::new(vec![poly]).unwrap();
        let text = perimeter.to_geojson_string();
        assert!(text.contains("MultiPolygon"));
        assert_eq!(FirePerimeter::from_geojson_str(&text).unwrap(), perimeter);
    }
}
