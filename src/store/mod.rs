//! Persistence seams for location records and help requests.
//!
//! The in-memory implementations in [`memory`] back the service today. A
//! durable backend implements the same traits; `compare_and_set` maps onto a
//! single guarded `UPDATE ... WHERE id = $1 AND status = ANY($2) RETURNING *`.

pub mod memory;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;
use crate::models::request::{HelpRequest, RequestId, RequestStatus};

/// Append-only location history with a per-actor "current" pointer.
pub trait LocationRepository: Send + Sync {
    /// Appends an observation. Returns `true` when it became the actor's
    /// current position, `false` when an equal-or-newer one was already held.
    fn append(&self, actor_id: ActorId, coordinate: Coordinate) -> Result<bool, AppError>;

    fn latest(&self, actor_id: ActorId) -> Result<Option<Coordinate>, AppError>;

    /// Actors without any observation are absent from the result.
    fn latest_many(
        &self,
        actor_ids: &HashSet<ActorId>,
    ) -> Result<HashMap<ActorId, Coordinate>, AppError>;

    /// Most recent first.
    fn recent(&self, actor_id: ActorId, limit: usize) -> Result<Vec<Coordinate>, AppError>;

    fn tracked_actors(&self) -> usize;
}

/// The fields a status transition is allowed to write.
#[derive(Debug, Clone, Copy)]
pub struct StatusChange {
    pub status: RequestStatus,
    pub assigned_volunteer_id: Option<ActorId>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum CasOutcome {
    /// The guard held and the change was written. Carries the new record.
    Updated(HelpRequest),
    /// The stored status was not one of the expected ones. Carries the
    /// untouched record.
    Rejected(HelpRequest),
    Missing,
}

pub trait RequestRepository: Send + Sync {
    fn next_id(&self) -> RequestId;

    fn insert(&self, request: HelpRequest) -> Result<(), AppError>;

    fn get(&self, id: RequestId) -> Result<Option<HelpRequest>, AppError>;

    fn list_by_status(&self, status: RequestStatus) -> Result<Vec<HelpRequest>, AppError>;

    /// Writes `change` only if the stored status is in `expected`, as one
    /// indivisible step against the backing store.
    fn compare_and_set(
        &self,
        id: RequestId,
        expected: &[RequestStatus],
        change: StatusChange,
    ) -> Result<CasOutcome, AppError>;
}
