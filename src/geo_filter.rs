//! Geographic Filter (C2): loads a boundary polygon from a GeoJSON-like
//! document and decides inside/outside for a point via ray casting (§4.2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::Context;
use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::Deserialize;
use tracing::info;

use crate::error::CoreError;

/// Handle into the path-keyed polygon cache. Cheap to copy; the polygon
/// itself is looked up through the filter on each `contains` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolygonHandle(usize);

#[derive(Debug, Deserialize)]
struct GeoJsonRing {
    /// `[[lon, lat], [lon, lat], ...]`, GeoJSON coordinate order.
    coordinates: Vec<Vec<[f64; 2]>>,
}

pub struct GeoFilter {
    by_path: RwLock<HashMap<PathBuf, PolygonHandle>>,
    polygons: RwLock<Vec<Polygon<f64>>>,
}

impl Default for GeoFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoFilter {
    pub fn new() -> Self {
        Self {
            by_path: RwLock::new(HashMap::new()),
            polygons: RwLock::new(Vec::new()),
        }
    }

    /// Idempotent, path-keyed load: a second `load` of the same path returns
    /// the same handle without re-reading the file (§4.2).
    pub fn load(&self, path: &Path) -> Result<PolygonHandle, CoreError> {
        if let Some(handle) = self.by_path.read().unwrap().get(path) {
            return Ok(*handle);
        }

        let polygon = Self::read_polygon(path)
            .with_context(|| format!("loading boundary polygon from {}", path.display()))
            .map_err(CoreError::Configuration)?;

        let mut polygons = self.polygons.write().unwrap();
        let handle = PolygonHandle(polygons.len());
        polygons.push(polygon);
        self.by_path.write().unwrap().insert(path.to_path_buf(), handle);
        info!(path = %path.display(), "loaded boundary polygon");
        Ok(handle)
    }

    /// Forces a re-read of `path` on its next `load`, used by the
    /// `reload-boundary` command (SIGHUP, §6).
    pub fn invalidate(&self, path: &Path) {
        self.by_path.write().unwrap().remove(path);
    }

    /// Ray-casting point-in-polygon. Points on an edge or vertex are treated
    /// as inside — `geo::Contains` for `Point` in `Polygon` already honors
    /// this (boundary-inclusive).
    pub fn contains(&self, handle: PolygonHandle, lat: f64, lon: f64) -> bool {
        let polygons = self.polygons.read().unwrap();
        let polygon = &polygons[handle.0];
        let point = Point::new(lon, lat);
        polygon.contains(&point) || point_on_boundary(polygon, &point)
    }

    fn read_polygon(path: &Path) -> anyhow::Result<Polygon<f64>> {
        let text = std::fs::read_to_string(path)?;
        let doc: GeoJsonRing = serde_json::from_str(&text)?;
        let ring = doc
            .coordinates
            .first()
            .context("GeoJSON polygon has no coordinate rings")?;

        let mut coords: Vec<Coord<f64>> = ring
            .iter()
            .map(|[lon, lat]| Coord { x: *lon, y: *lat })
            .collect();

        dedup_consecutive(&mut coords);
        anyhow::ensure!(
            coords.len() >= 3,
            "degenerate polygon: fewer than 3 distinct vertices"
        );

        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }

        Ok(Polygon::new(LineString(coords), vec![]))
    }
}

fn dedup_consecutive(coords: &mut Vec<Coord<f64>>) {
    coords.dedup_by(|a, b| a.x == b.x && a.y == b.y);
}

/// `geo::Contains` already treats vertices/edges as inside for closed
/// rings; this helper exists so the intent is documented rather than
/// relying on an undocumented crate behavior.
fn point_on_boundary(polygon: &Polygon<f64>, point: &Point<f64>) -> bool {
    polygon.exterior().contains(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_square(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"coordinates": [[[-10.0, -10.0], [10.0, -10.0], [10.0, 10.0], [-10.0, 10.0]]]}}"#
        )
        .unwrap();
        path
    }

    #[test]
    fn load_is_idempotent_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_square(&dir, "boundary.json");
        let filter = GeoFilter::new();
        let h1 = filter.load(&path).unwrap();
        let h2 = filter.load(&path).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn contains_point_inside_and_outside() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_square(&dir, "boundary.json");
        let filter = GeoFilter::new();
        let handle = filter.load(&path).unwrap();
        assert!(filter.contains(handle, 0.0, 0.0));
        assert!(!filter.contains(handle, 50.0, 50.0));
    }

    #[test]
    fn degenerate_polygon_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"coordinates": [[[0.0, 0.0], [0.0, 0.0]]]}"#).unwrap();
        let filter = GeoFilter::new();
        let err = filter.load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_square(&dir, "boundary.json");
        let filter = GeoFilter::new();
        let h1 = filter.load(&path).unwrap();
        filter.invalidate(&path);
        let h2 = filter.load(&path).unwrap();
        assert_ne!(h1, h2);
    }
}
