use crate::models::coordinate::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres. Inputs are assumed validated.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().atan2((1.0 - haversine).max(0.0).sqrt());

    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::distance_km;
    use crate::models::coordinate::Coordinate;

    fn at(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = at(21.0285, 105.8542);
        assert_eq!(distance_km(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (at(10.0, 20.0), at(10.02, 20.0)),
            (at(-33.8688, 151.2093), at(51.5074, -0.1278)),
            (at(89.9, 0.0), at(-89.9, 179.9)),
        ];

        for (a, b) in pairs {
            assert_eq!(distance_km(&a, &b), distance_km(&b, &a));
        }
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = at(51.5074, -0.1278);
        let paris = at(48.8566, 2.3522);
        let distance = distance_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let distance = distance_km(&at(0.0, 0.0), &at(0.0, 180.0));
        assert!((distance - std::f64::consts::PI * 6_371.0).abs() < 1e-6);
    }
}
