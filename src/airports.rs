//! Reference Store (C3): an immutable ICAO → airport map loaded once at
//! startup, with a bounding-box nearest-airport query for the Landing
//! Detector (§4.3, §4.7).

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::error::CoreError;
use crate::geo_math::haversine_distance_nm;
use crate::models::Airport;

/// Degrees of latitude/longitude per nautical mile, used to bound the
/// candidate set before computing exact great-circle distance (§4.3:
/// "simple great-circle filter ... no spatial index required").
const NM_PER_DEGREE_LAT: f64 = 60.0;

pub struct AirportStore {
    by_icao: HashMap<String, Airport>,
}

impl AirportStore {
    /// Loads the bundled airport reference file (a JSON array of
    /// `{icao, lat, lon, elevation_ft}` records) into an immutable map.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading airport reference file {}", path.display()))
            .map_err(CoreError::Configuration)?;
        let airports: Vec<Airport> = serde_json::from_str(&text)
            .context("parsing airport reference file")
            .map_err(CoreError::Configuration)?;

        let by_icao = airports.into_iter().map(|a| (a.icao.clone(), a)).collect();
        Ok(Self { by_icao })
    }

    pub fn from_airports(airports: Vec<Airport>) -> Self {
        let by_icao = airports.into_iter().map(|a| (a.icao.clone(), a)).collect();
        Self { by_icao }
    }

    pub fn len(&self) -> usize {
        self.by_icao.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_icao.is_empty()
    }

    pub fn get(&self, icao: &str) -> Option<&Airport> {
        self.by_icao.get(icao)
    }

    /// Nearest airport to `(lat, lon)` within `radius_nm`, or `None` if no
    /// airport in the store falls within the bounding box around the point.
    pub fn nearest_within(&self, lat: f64, lon: f64, radius_nm: f64) -> Option<(&Airport, f64)> {
        let lat_delta = radius_nm / NM_PER_DEGREE_LAT;
        let lon_delta = radius_nm / (NM_PER_DEGREE_LAT * lat.to_radians().cos().max(0.01));

        self.by_icao
            .values()
            .filter(|a| {
                (a.lat - lat).abs() <= lat_delta && (a.lon - lon).abs() <= lon_delta
            })
            .map(|a| (a, haversine_distance_nm(lat, lon, a.lat, a.lon)))
            .filter(|(_, d)| *d <= radius_nm)
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AirportStore {
        AirportStore::from_airports(vec![
            Airport {
                icao: "YSSY".into(),
                lat: -33.9461,
                lon: 151.1772,
                elevation_ft: 21.0,
            },
            Airport {
                icao: "YMML".into(),
                lat: -37.6690,
                lon: 144.8410,
                elevation_ft: 434.0,
            },
        ])
    }

    #[test]
    fn finds_nearest_within_radius() {
        let s = store();
        let (airport, dist) = s.nearest_within(-33.95, 151.18, 15.0).unwrap();
        assert_eq!(airport.icao, "YSSY");
        assert!(dist < 15.0);
    }

    #[test]
    fn returns_none_outside_radius() {
        let s = store();
        assert!(s.nearest_within(0.0, 0.0, 15.0).is_none());
    }

    #[test]
    fn get_looks_up_by_icao() {
        let s = store();
        assert_eq!(s.get("YMML").unwrap().elevation_ft, 434.0);
        assert!(s.get("ZZZZ").is_none());
    }
}
