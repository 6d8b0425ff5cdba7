//! Authoritative record of help requests.
//!
//! Every status change goes through [`RequestRepository::compare_and_set`]
//! guarded by the status the transition starts from, so two callers racing
//! on the same request can never both succeed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::directory::AccountDirectory;
use crate::error::AppError;
use crate::location::LocationStore;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;
use crate::models::request::{HelpRequest, RequestId, RequestStatus};
use crate::store::{CasOutcome, RequestRepository, StatusChange};

#[derive(Debug, Clone, PartialEq)]
pub enum AssignOutcome {
    Assigned(HelpRequest),
    AlreadyAssigned,
    NotFound,
}

#[derive(Clone)]
pub struct RequestLedger {
    repository: Arc<dyn RequestRepository>,
    directory: Arc<dyn AccountDirectory>,
    locations: LocationStore,
}

impl RequestLedger {
    pub fn new(
        repository: Arc<dyn RequestRepository>,
        directory: Arc<dyn AccountDirectory>,
        locations: LocationStore,
    ) -> Self {
        Self {
            repository,
            directory,
            locations,
        }
    }

    /// Opens a pending request at `origin`. The origin is also recorded as
    /// the requester's latest observation.
    pub fn create(
        &self,
        requester_id: ActorId,
        origin: Coordinate,
    ) -> Result<HelpRequest, AppError> {
        if !self.directory.actor_exists(requester_id) {
            return Err(AppError::ActorNotFound(requester_id));
        }
        self.locations.record_location(requester_id, origin)?;

        let request = HelpRequest {
            id: self.repository.next_id(),
            requester_id,
            origin,
            status: RequestStatus::Pending,
            assigned_volunteer_id: None,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.repository.insert(request.clone())?;

        info!(
            request_id = request.id,
            requester_id,
            latitude = origin.latitude,
            longitude = origin.longitude,
            "help request created"
        );
        Ok(request)
    }

    pub fn get(&self, id: RequestId) -> Result<HelpRequest, AppError> {
        self.repository.get(id)?.ok_or(AppError::NotFound(id))
    }

    /// Oldest first.
    pub fn list_pending(&self) -> Result<Vec<HelpRequest>, AppError> {
        let mut pending = self.repository.list_by_status(RequestStatus::Pending)?;
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    /// Volunteers currently holding an accepted request.
    pub fn busy_volunteers(&self) -> Result<HashSet<ActorId>, AppError> {
        Ok(self
            .repository
            .list_by_status(RequestStatus::Accepted)?
            .into_iter()
            .filter_map(|request| request.assigned_volunteer_id)
            .collect())
    }

    pub fn try_assign(
        &self,
        request_id: RequestId,
        volunteer_id: ActorId,
    ) -> Result<AssignOutcome, AppError> {
        let change = StatusChange {
            status: RequestStatus::Accepted,
            assigned_volunteer_id: Some(volunteer_id),
            resolved_at: None,
        };

        match self
            .repository
            .compare_and_set(request_id, &[RequestStatus::Pending], change)?
        {
            CasOutcome::Updated(request) => {
                info!(request_id, volunteer_id, "request assigned");
                Ok(AssignOutcome::Assigned(request))
            }
            CasOutcome::Rejected(current) => {
                warn!(
                    request_id,
                    volunteer_id,
                    status = %current.status,
                    "accept lost: request no longer pending"
                );
                Ok(AssignOutcome::AlreadyAssigned)
            }
            CasOutcome::Missing => Ok(AssignOutcome::NotFound),
        }
    }

    /// Only the assigned volunteer may complete an accepted request.
    pub fn complete(&self, request_id: RequestId, by: ActorId) -> Result<HelpRequest, AppError> {
        let current = self.get(request_id)?;
        if current.status != RequestStatus::Accepted {
            return Err(invalid_transition(&current, "complete"));
        }
        if current.assigned_volunteer_id != Some(by) {
            return Err(AppError::InvalidActor(format!(
                "actor {by} is not the volunteer assigned to request {request_id}"
            )));
        }

        let change = StatusChange {
            status: RequestStatus::Completed,
            assigned_volunteer_id: Some(by),
            resolved_at: Some(Utc::now()),
        };
        let completed = self.apply(request_id, &[RequestStatus::Accepted], change, "complete")?;

        info!(request_id, volunteer_id = by, "request completed");
        Ok(completed)
    }

    /// Only the requester may cancel, from pending or accepted.
    pub fn cancel(&self, request_id: RequestId, by: ActorId) -> Result<HelpRequest, AppError> {
        let current = self.get(request_id)?;
        if current.status.is_terminal() {
            return Err(invalid_transition(&current, "cancel"));
        }
        if current.requester_id != by {
            return Err(AppError::InvalidActor(format!(
                "actor {by} did not submit request {request_id}"
            )));
        }

        let change = StatusChange {
            status: RequestStatus::Cancelled,
            assigned_volunteer_id: None,
            resolved_at: Some(Utc::now()),
        };
        let cancelled = self.apply(
            request_id,
            &[RequestStatus::Pending, RequestStatus::Accepted],
            change,
            "cancel",
        )?;

        info!(request_id, requester_id = by, "request cancelled");
        Ok(cancelled)
    }

    pub fn pending_count(&self) -> Result<usize, AppError> {
        Ok(self.repository.list_by_status(RequestStatus::Pending)?.len())
    }

    fn apply(
        &self,
        request_id: RequestId,
        expected: &[RequestStatus],
        change: StatusChange,
        action: &'static str,
    ) -> Result<HelpRequest, AppError> {
        match self.repository.compare_and_set(request_id, expected, change)? {
            CasOutcome::Updated(request) => Ok(request),
            CasOutcome::Rejected(current) => {
                warn!(request_id, status = %current.status, action, "transition lost a race");
                Err(invalid_transition(&current, action))
            }
            CasOutcome::Missing => Err(AppError::NotFound(request_id)),
        }
    }
}

fn invalid_transition(request: &HelpRequest, action: &'static str) -> AppError {
    AppError::InvalidTransition {
        id: request.id,
        from: request.status,
        action,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use chrono::Utc;

    use super::{AssignOutcome, RequestLedger};
    use crate::directory::InMemoryDirectory;
    use crate::error::AppError;
    use crate::location::LocationStore;
    use crate::models::actor::{Actor, ContactInfo, Role};
    use crate::models::coordinate::Coordinate;
    use crate::models::request::RequestStatus;
    use crate::store::memory::{InMemoryLocations, InMemoryRequests};

    const REQUESTER: i64 = 1;
    const VOLUNTEER: i64 = 2;

    fn ledger() -> RequestLedger {
        let directory = InMemoryDirectory::new();
        for (id, role) in [(REQUESTER, Role::Requester), (VOLUNTEER, Role::Volunteer)] {
            directory.upsert(Actor {
                id,
                role,
                contact: ContactInfo::default(),
            });
        }

        RequestLedger::new(
            Arc::new(InMemoryRequests::new()),
            Arc::new(directory),
            LocationStore::new(Arc::new(InMemoryLocations::new(10))),
        )
    }

    fn origin() -> Coordinate {
        Coordinate {
            latitude: 10.0,
            longitude: 20.0,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn create_starts_pending_without_assignee() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.assigned_volunteer_id.is_none());
        assert!(request.resolved_at.is_none());
        assert_eq!(ledger.locations.current_location(REQUESTER).unwrap(), Some(request.origin));
    }

    #[test]
    fn create_for_unknown_requester_fails() {
        let err = ledger().create(99, origin()).unwrap_err();
        assert!(matches!(err, AppError::ActorNotFound(99)));
    }

    #[test]
    fn pending_is_oldest_first_and_excludes_accepted() {
        let ledger = ledger();
        let first = ledger.create(REQUESTER, origin()).unwrap();
        let second = ledger.create(REQUESTER, origin()).unwrap();
        let third = ledger.create(REQUESTER, origin()).unwrap();

        ledger.try_assign(second.id, VOLUNTEER).unwrap();

        let ids: Vec<i64> = ledger.list_pending().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[test]
    fn second_assignment_is_already_assigned() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();

        let first = ledger.try_assign(request.id, VOLUNTEER).unwrap();
        let second = ledger.try_assign(request.id, 3).unwrap();

        assert!(matches!(first, AssignOutcome::Assigned(ref r) if r.assigned_volunteer_id == Some(VOLUNTEER)));
        assert_eq!(second, AssignOutcome::AlreadyAssigned);
        assert_eq!(
            ledger.get(request.id).unwrap().assigned_volunteer_id,
            Some(VOLUNTEER)
        );
    }

    #[test]
    fn assign_unknown_request_is_not_found() {
        assert_eq!(ledger().try_assign(404, VOLUNTEER).unwrap(), AssignOutcome::NotFound);
    }

    #[test]
    fn concurrent_assignment_has_exactly_one_winner() {
        const CONTENDERS: usize = 32;

        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();
        let barrier = Barrier::new(CONTENDERS);

        let outcomes: Vec<AssignOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = (0..CONTENDERS)
                .map(|i| {
                    let ledger = &ledger;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        ledger.try_assign(request.id, 100 + i as i64).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                AssignOutcome::Assigned(r) => Some(r.assigned_volunteer_id),
                _ => None,
            })
            .collect();
        let losers = outcomes
            .iter()
            .filter(|o| **o == AssignOutcome::AlreadyAssigned)
            .count();

        assert_eq!(winners.len(), 1);
        assert_eq!(losers, CONTENDERS - 1);
        assert_eq!(ledger.get(request.id).unwrap().assigned_volunteer_id, winners[0]);
    }

    #[test]
    fn complete_requires_accepted() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();

        let err = ledger.complete(request.id, VOLUNTEER).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: RequestStatus::Pending,
                ..
            }
        ));
    }

    #[test]
    fn complete_by_assigned_volunteer() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();
        ledger.try_assign(request.id, VOLUNTEER).unwrap();

        let completed = ledger.complete(request.id, VOLUNTEER).unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
        assert_eq!(completed.assigned_volunteer_id, Some(VOLUNTEER));
        assert!(completed.resolved_at.is_some());
        assert!(ledger.busy_volunteers().unwrap().is_empty());
    }

    #[test]
    fn complete_by_other_actor_is_rejected() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();
        ledger.try_assign(request.id, VOLUNTEER).unwrap();

        let err = ledger.complete(request.id, REQUESTER).unwrap_err();
        assert!(matches!(err, AppError::InvalidActor(_)));
        assert_eq!(ledger.get(request.id).unwrap().status, RequestStatus::Accepted);
    }

    #[test]
    fn cancel_accepted_clears_assignee() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();
        ledger.try_assign(request.id, VOLUNTEER).unwrap();

        let cancelled = ledger.cancel(request.id, REQUESTER).unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert!(cancelled.assigned_volunteer_id.is_none());
    }

    #[test]
    fn terminal_requests_are_immutable() {
        let ledger = ledger();
        let request = ledger.create(REQUESTER, origin()).unwrap();
        let cancelled = ledger.cancel(request.id, REQUESTER).unwrap();

        for err in [
            ledger.cancel(request.id, REQUESTER).unwrap_err(),
            ledger.complete(request.id, VOLUNTEER).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                AppError::InvalidTransition {
                    from: RequestStatus::Cancelled,
                    ..
                }
            ));
        }
        assert_eq!(
            ledger.try_assign(request.id, VOLUNTEER).unwrap(),
            AssignOutcome::AlreadyAssigned
        );
        assert_eq!(ledger.get(request.id).unwrap(), cancelled);
    }

    #[test]
    fn cancel_unknown_request_is_not_found() {
        let err = ledger().cancel(7, REQUESTER).unwrap_err();
        assert!(matches!(err, AppError::NotFound(7)));
    }
}
