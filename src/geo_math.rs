//! Great-circle distance, shared by the Reference Store (C3), Landing
//! Detector (C7), and ATC<->Flight Matcher (C9).

const EARTH_RADIUS_NM: f64 = 3440.065;

/// Haversine great-circle distance in nautical miles.
pub fn haversine_distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_NM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(haversine_distance_nm(-33.9461, 151.1772, -33.9461, 151.1772), 0.0);
    }

    #[test]
    fn known_distance_sydney_to_melbourne() {
        // YSSY to YMML is approximately 380 nm.
        let d = haversine_distance_nm(-33.9461, 151.1772, -37.6690, 144.8410);
        assert!((350.0..420.0).contains(&d), "unexpected distance {d}");
    }
}
