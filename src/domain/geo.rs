//! Great-circle distance for distance-based discovery filtering.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two points given in degrees.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        assert!(haversine_km(38.72, -9.14, 38.72, -9.14).abs() < 1e-9);
    }

    #[test]
    fn lisbon_to_madrid() {
        // Roughly 503 km as the crow flies.
        let d = haversine_km(38.7223, -9.1393, 40.4168, -3.7038);
        assert!((495.0..515.0).contains(&d), "got {d}");
    }
}
