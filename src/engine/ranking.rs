use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::distance_km;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedVolunteer {
    pub volunteer_id: ActorId,
    pub distance_km: f64,
}

/// Nearest first; equal distances fall back to the lower actor id.
///
/// Advisory only: nothing here reserves a volunteer.
pub fn rank_volunteers(
    origin: &Coordinate,
    candidates: &HashMap<ActorId, Coordinate>,
    max_radius_km: Option<f64>,
) -> Vec<RankedVolunteer> {
    let mut ranked: Vec<RankedVolunteer> = candidates
        .iter()
        .map(|(volunteer_id, location)| RankedVolunteer {
            volunteer_id: *volunteer_id,
            distance_km: distance_km(origin, location),
        })
        .filter(|ranked| within_radius(ranked.distance_km, max_radius_km))
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.volunteer_id.cmp(&b.volunteer_id))
    });
    ranked
}

pub fn within_radius(distance_km: f64, max_radius_km: Option<f64>) -> bool {
    max_radius_km.is_none_or(|radius| distance_km <= radius)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::rank_volunteers;
    use crate::models::coordinate::Coordinate;

    fn at(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn nearest_volunteer_ranks_first() {
        let origin = at(10.0, 20.0);
        let candidates = HashMap::from([
            (5, at(10.045, 20.0)),
            (6, at(10.018, 20.0)),
            (7, at(10.5, 20.0)),
        ]);

        let ranked = rank_volunteers(&origin, &candidates, None);
        let ids: Vec<i64> = ranked.iter().map(|r| r.volunteer_id).collect();

        assert_eq!(ids, vec![6, 5, 7]);
        assert!((ranked[0].distance_km - 2.0).abs() < 0.05);
        assert!((ranked[1].distance_km - 5.0).abs() < 0.05);
    }

    #[test]
    fn equal_distance_breaks_ties_by_actor_id() {
        let origin = at(0.0, 0.0);
        let spot = at(0.01, 0.01);
        let candidates = HashMap::from([(30, spot), (10, spot), (20, spot)]);

        let ids: Vec<i64> = rank_volunteers(&origin, &candidates, None)
            .iter()
            .map(|r| r.volunteer_id)
            .collect();

        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn radius_cutoff_drops_far_volunteers() {
        let origin = at(10.0, 20.0);
        let candidates = HashMap::from([(1, at(10.018, 20.0)), (2, at(11.0, 20.0))]);

        let ranked = rank_volunteers(&origin, &candidates, Some(10.0));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].volunteer_id, 1);
    }

    #[test]
    fn no_candidates_yields_empty_ranking() {
        assert!(rank_volunteers(&at(0.0, 0.0), &HashMap::new(), None).is_empty());
    }
}
