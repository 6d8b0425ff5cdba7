//! External-facing dispatch operations.
//!
//! Validates input, delegates to the ledger, location store and matching
//! engine, and publishes an [`AssignmentEvent`] for every lifecycle change.
//! No business rules live here.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::directory::AccountDirectory;
use crate::engine::matching::MatchingEngine;
use crate::engine::ranking::RankedVolunteer;
use crate::error::AppError;
use crate::ledger::RequestLedger;
use crate::location::LocationStore;
use crate::models::actor::{ActorId, ContactInfo};
use crate::models::coordinate::Coordinate;
use crate::models::event::{AssignmentEvent, EventKind};
use crate::models::request::{HelpRequest, RequestId};
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Serialize)]
pub struct PendingRequestView {
    pub request: HelpRequest,
    pub distance_km: Option<f64>,
    pub requester_contact: ContactInfo,
    pub ranked_volunteers: Vec<RankedVolunteer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRequest {
    pub request: HelpRequest,
    pub requester_contact: ContactInfo,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationAck {
    pub ack: bool,
    pub current_advanced: bool,
}

#[derive(Clone)]
pub struct DispatchApi {
    directory: Arc<dyn AccountDirectory>,
    locations: LocationStore,
    ledger: RequestLedger,
    matching: MatchingEngine,
    events_tx: broadcast::Sender<AssignmentEvent>,
    metrics: Metrics,
    history_default_limit: usize,
}

impl DispatchApi {
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        locations: LocationStore,
        ledger: RequestLedger,
        matching: MatchingEngine,
        events_tx: broadcast::Sender<AssignmentEvent>,
        metrics: Metrics,
        history_default_limit: usize,
    ) -> Self {
        Self {
            directory,
            locations,
            ledger,
            matching,
            events_tx,
            metrics,
            history_default_limit,
        }
    }

    pub fn submit_request(
        &self,
        requester_id: ActorId,
        latitude: f64,
        longitude: f64,
        recorded_at: Option<DateTime<Utc>>,
    ) -> Result<HelpRequest, AppError> {
        let origin = Coordinate::new(latitude, longitude, recorded_at.unwrap_or_else(Utc::now))?;
        let request = self.ledger.create(requester_id, origin)?;

        self.metrics
            .help_requests_total
            .with_label_values(&["submitted"])
            .inc();
        self.publish(EventKind::Submitted, &request);
        Ok(request)
    }

    pub fn report_location(
        &self,
        actor_id: ActorId,
        latitude: f64,
        longitude: f64,
        recorded_at: Option<DateTime<Utc>>,
    ) -> Result<LocationAck, AppError> {
        let coordinate = Coordinate::new(latitude, longitude, recorded_at.unwrap_or_else(Utc::now))?;
        self.ensure_actor(actor_id)?;

        let advanced = self.locations.record_location(actor_id, coordinate)?;
        let result = if advanced { "advanced" } else { "stale" };
        self.metrics
            .location_updates_total
            .with_label_values(&[result])
            .inc();
        debug!(actor_id, result, "location reported");

        Ok(LocationAck {
            ack: true,
            current_advanced: advanced,
        })
    }

    pub fn list_pending_requests(
        &self,
        volunteer_id: Option<ActorId>,
    ) -> Result<Vec<PendingRequestView>, AppError> {
        let pending = self.matching.pending_for(volunteer_id)?;

        Ok(pending
            .into_iter()
            .map(|matched| PendingRequestView {
                requester_contact: self.contact_of(matched.request.requester_id),
                request: matched.request,
                distance_km: matched.distance_km,
                ranked_volunteers: matched.ranked_volunteers,
            })
            .collect())
    }

    pub fn get_request(&self, request_id: RequestId) -> Result<HelpRequest, AppError> {
        self.ledger.get(request_id)
    }

    pub fn accept_request(
        &self,
        request_id: RequestId,
        volunteer_id: ActorId,
    ) -> Result<AcceptedRequest, AppError> {
        let start = Instant::now();
        let result = self.matching.accept(request_id, volunteer_id);

        let outcome = match &result {
            Ok(_) => "assigned",
            Err(err) => err.code(),
        };
        self.metrics
            .accept_attempts_total
            .with_label_values(&[outcome])
            .inc();
        self.metrics
            .accept_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        let request = result?;
        self.publish(EventKind::Accepted, &request);

        Ok(AcceptedRequest {
            requester_contact: self.contact_of(request.requester_id),
            request,
        })
    }

    pub fn complete_request(
        &self,
        request_id: RequestId,
        actor_id: ActorId,
    ) -> Result<HelpRequest, AppError> {
        let request = self.ledger.complete(request_id, actor_id)?;
        self.metrics
            .help_requests_total
            .with_label_values(&["completed"])
            .inc();
        self.publish(EventKind::Completed, &request);
        Ok(request)
    }

    pub fn cancel_request(
        &self,
        request_id: RequestId,
        actor_id: ActorId,
    ) -> Result<HelpRequest, AppError> {
        let request = self.ledger.cancel(request_id, actor_id)?;
        self.metrics
            .help_requests_total
            .with_label_values(&["cancelled"])
            .inc();
        self.publish(EventKind::Cancelled, &request);
        Ok(request)
    }

    /// `None` means the actor exists but has never reported a position.
    pub fn last_known_location(&self, actor_id: ActorId) -> Result<Option<Coordinate>, AppError> {
        self.ensure_actor(actor_id)?;
        self.locations.current_location(actor_id)
    }

    pub fn location_history(
        &self,
        actor_id: ActorId,
        limit: Option<usize>,
    ) -> Result<Vec<Coordinate>, AppError> {
        self.ensure_actor(actor_id)?;
        self.locations
            .history(actor_id, limit.unwrap_or(self.history_default_limit))
    }

    pub fn pending_count(&self) -> Result<usize, AppError> {
        self.ledger.pending_count()
    }

    pub fn tracked_actors(&self) -> usize {
        self.locations.tracked_actors()
    }

    fn ensure_actor(&self, actor_id: ActorId) -> Result<(), AppError> {
        if self.directory.actor_exists(actor_id) {
            Ok(())
        } else {
            Err(AppError::ActorNotFound(actor_id))
        }
    }

    fn contact_of(&self, actor_id: ActorId) -> ContactInfo {
        self.directory.contact_info(actor_id).unwrap_or_default()
    }

    fn publish(&self, kind: EventKind, request: &HelpRequest) {
        if let Ok(pending) = self.ledger.pending_count() {
            self.metrics.pending_requests.set(pending as i64);
        }
        let _ = self
            .events_tx
            .send(AssignmentEvent::new(kind, request.clone()));
    }
}
