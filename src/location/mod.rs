use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::AppError;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;
use crate::store::LocationRepository;

/// Latest known position per actor plus a bounded history for family
/// monitoring.
///
/// "Current" only ever moves forward in `recorded_at`; an observation that
/// arrives late is kept in history but never replaces a newer position.
#[derive(Clone)]
pub struct LocationStore {
    repository: Arc<dyn LocationRepository>,
}

impl LocationStore {
    pub fn new(repository: Arc<dyn LocationRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether the observation became the actor's current position.
    pub fn record_location(
        &self,
        actor_id: ActorId,
        coordinate: Coordinate,
    ) -> Result<bool, AppError> {
        coordinate.validate()?;

        let advanced = self.repository.append(actor_id, coordinate)?;
        if !advanced {
            debug!(
                actor_id,
                recorded_at = %coordinate.recorded_at,
                "stale location kept in history only"
            );
        }

        Ok(advanced)
    }

    pub fn current_location(&self, actor_id: ActorId) -> Result<Option<Coordinate>, AppError> {
        self.repository.latest(actor_id)
    }

    pub fn history(&self, actor_id: ActorId, limit: usize) -> Result<Vec<Coordinate>, AppError> {
        self.repository.recent(actor_id, limit)
    }

    pub fn current_locations_of(
        &self,
        actor_ids: &HashSet<ActorId>,
    ) -> Result<HashMap<ActorId, Coordinate>, AppError> {
        self.repository.latest_many(actor_ids)
    }

    pub fn tracked_actors(&self) -> usize {
        self.repository.tracked_actors()
    }
}
