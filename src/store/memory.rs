use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use crate::error::AppError;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;
use crate::models::request::{HelpRequest, RequestId, RequestStatus};
use crate::store::{CasOutcome, LocationRepository, RequestRepository, StatusChange};

/// Per-actor history kept sorted by `recorded_at`, oldest at the front.
#[derive(Debug, Default)]
struct Track {
    observations: VecDeque<Coordinate>,
}

pub struct InMemoryLocations {
    tracks: DashMap<ActorId, Track>,
    capacity: usize,
}

impl InMemoryLocations {
    pub fn new(capacity: usize) -> Self {
        Self {
            tracks: DashMap::new(),
            capacity: capacity.max(1),
        }
    }
}

impl LocationRepository for InMemoryLocations {
    fn append(&self, actor_id: ActorId, coordinate: Coordinate) -> Result<bool, AppError> {
        let mut track = self.tracks.entry(actor_id).or_default();
        let observations = &mut track.observations;

        let position =
            observations.partition_point(|held| held.recorded_at <= coordinate.recorded_at);
        let becomes_current = position == observations.len();
        observations.insert(position, coordinate);

        while observations.len() > self.capacity {
            observations.pop_front();
        }

        Ok(becomes_current)
    }

    fn latest(&self, actor_id: ActorId) -> Result<Option<Coordinate>, AppError> {
        Ok(self
            .tracks
            .get(&actor_id)
            .and_then(|track| track.observations.back().copied()))
    }

    fn latest_many(
        &self,
        actor_ids: &HashSet<ActorId>,
    ) -> Result<HashMap<ActorId, Coordinate>, AppError> {
        let mut found = HashMap::with_capacity(actor_ids.len());
        for actor_id in actor_ids {
            if let Some(coordinate) = self.latest(*actor_id)? {
                found.insert(*actor_id, coordinate);
            }
        }
        Ok(found)
    }

    fn recent(&self, actor_id: ActorId, limit: usize) -> Result<Vec<Coordinate>, AppError> {
        Ok(self
            .tracks
            .get(&actor_id)
            .map(|track| track.observations.iter().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }

    fn tracked_actors(&self) -> usize {
        self.tracks.len()
    }
}

pub struct InMemoryRequests {
    requests: DashMap<RequestId, HelpRequest>,
    sequence: AtomicI64,
}

impl InMemoryRequests {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
            sequence: AtomicI64::new(0),
        }
    }
}

impl Default for InMemoryRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestRepository for InMemoryRequests {
    fn next_id(&self) -> RequestId {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn insert(&self, request: HelpRequest) -> Result<(), AppError> {
        if self.requests.contains_key(&request.id) {
            return Err(AppError::Internal(format!(
                "request {} already stored",
                request.id
            )));
        }
        self.requests.insert(request.id, request);
        Ok(())
    }

    fn get(&self, id: RequestId) -> Result<Option<HelpRequest>, AppError> {
        Ok(self.requests.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_by_status(&self, status: RequestStatus) -> Result<Vec<HelpRequest>, AppError> {
        Ok(self
            .requests
            .iter()
            .filter(|entry| entry.value().status == status)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn compare_and_set(
        &self,
        id: RequestId,
        expected: &[RequestStatus],
        change: StatusChange,
    ) -> Result<CasOutcome, AppError> {
        // The shard write lock is held from the status check through the write.
        let Some(mut request) = self.requests.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };

        if !expected.contains(&request.status) {
            return Ok(CasOutcome::Rejected(request.clone()));
        }

        request.status = change.status;
        request.assigned_volunteer_id = change.assigned_volunteer_id;
        request.resolved_at = change.resolved_at;

        Ok(CasOutcome::Updated(request.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{InMemoryLocations, InMemoryRequests};
    use crate::models::coordinate::Coordinate;
    use crate::models::request::{HelpRequest, RequestStatus};
    use crate::store::{CasOutcome, LocationRepository, RequestRepository, StatusChange};

    fn at_second(second: i64, latitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude: 0.0,
            recorded_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(second),
        }
    }

    #[test]
    fn history_capacity_drops_oldest() {
        let store = InMemoryLocations::new(2);
        for second in 0..3 {
            store.append(7, at_second(second, second as f64)).unwrap();
        }

        let recent = store.recent(7, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].latitude, 2.0);
        assert_eq!(recent[1].latitude, 1.0);
    }

    #[test]
    fn late_observation_is_kept_in_history_but_not_current() {
        let store = InMemoryLocations::new(10);
        assert!(store.append(7, at_second(10, 1.0)).unwrap());
        assert!(!store.append(7, at_second(5, 2.0)).unwrap());

        assert_eq!(store.latest(7).unwrap().unwrap().latitude, 1.0);
        let recent = store.recent(7, 10).unwrap();
        assert_eq!(recent.iter().map(|c| c.latitude).collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn cas_rejects_unexpected_status_without_writing() {
        let store = InMemoryRequests::new();
        let id = store.next_id();
        store
            .insert(HelpRequest {
                id,
                requester_id: 1,
                origin: at_second(0, 10.0),
                status: RequestStatus::Completed,
                assigned_volunteer_id: Some(2),
                created_at: Utc::now(),
                resolved_at: Some(Utc::now()),
            })
            .unwrap();

        let outcome = store
            .compare_and_set(
                id,
                &[RequestStatus::Pending],
                StatusChange {
                    status: RequestStatus::Accepted,
                    assigned_volunteer_id: Some(3),
                    resolved_at: None,
                },
            )
            .unwrap();

        assert!(matches!(outcome, CasOutcome::Rejected(ref r) if r.assigned_volunteer_id == Some(2)));
        assert_eq!(store.get(id).unwrap().unwrap().status, RequestStatus::Completed);
    }

    #[test]
    fn cas_on_missing_request() {
        let store = InMemoryRequests::new();
        let outcome = store
            .compare_and_set(
                42,
                &[RequestStatus::Pending],
                StatusChange {
                    status: RequestStatus::Cancelled,
                    assigned_volunteer_id: None,
                    resolved_at: None,
                },
            )
            .unwrap();
        assert!(matches!(outcome, CasOutcome::Missing));
    }
}
