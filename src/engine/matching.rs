use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use crate::directory::AccountDirectory;
use crate::engine::ranking::{rank_volunteers, within_radius, RankedVolunteer};
use crate::error::AppError;
use crate::geo::distance_km;
use crate::ledger::{AssignOutcome, RequestLedger};
use crate::location::LocationStore;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;
use crate::models::request::{HelpRequest, RequestId};

#[derive(Debug, Clone, Copy)]
pub struct MatchingSettings {
    pub max_radius_km: Option<f64>,
    pub ranking_limit: usize,
}

/// A pending request as seen by one (optional) volunteer.
#[derive(Debug, Clone)]
pub struct PendingMatch {
    pub request: HelpRequest,
    /// From the viewing volunteer's current position to the request origin.
    pub distance_km: Option<f64>,
    pub ranked_volunteers: Vec<RankedVolunteer>,
}

#[derive(Clone)]
pub struct MatchingEngine {
    ledger: RequestLedger,
    locations: LocationStore,
    directory: Arc<dyn AccountDirectory>,
    settings: MatchingSettings,
}

impl MatchingEngine {
    pub fn new(
        ledger: RequestLedger,
        locations: LocationStore,
        directory: Arc<dyn AccountDirectory>,
        settings: MatchingSettings,
    ) -> Self {
        Self {
            ledger,
            locations,
            directory,
            settings,
        }
    }

    /// Volunteers with a known position who are not holding an accepted
    /// request.
    pub fn available_volunteers(&self) -> Result<HashMap<ActorId, Coordinate>, AppError> {
        let busy = self.ledger.busy_volunteers()?;
        let idle: HashSet<ActorId> = self
            .directory
            .volunteer_ids()
            .into_iter()
            .filter(|id| !busy.contains(id))
            .collect();

        self.locations.current_locations_of(&idle)
    }

    pub fn rank_for(&self, request: &HelpRequest) -> Result<Vec<RankedVolunteer>, AppError> {
        let available = self.available_volunteers()?;
        Ok(self.rank_among(request, &available))
    }

    /// Every pending request, with advisory volunteer rankings attached.
    ///
    /// With a located viewer the list is nearest-first (unknown distances
    /// last); otherwise it keeps the ledger's oldest-first order. Ties keep
    /// oldest-first as well.
    pub fn pending_for(&self, viewer: Option<ActorId>) -> Result<Vec<PendingMatch>, AppError> {
        let viewer_location = match viewer {
            Some(id) => self.locations.current_location(id)?,
            None => None,
        };
        let available = self.available_volunteers()?;

        let mut matches: Vec<PendingMatch> = self
            .ledger
            .list_pending()?
            .into_iter()
            .filter(|request| Some(request.requester_id) != viewer)
            .map(|request| {
                let distance = viewer_location
                    .as_ref()
                    .map(|location| distance_km(location, &request.origin));
                let ranked_volunteers = self.rank_among(&request, &available);
                PendingMatch {
                    request,
                    distance_km: distance,
                    ranked_volunteers,
                }
            })
            .filter(|pending| {
                pending
                    .distance_km
                    .is_none_or(|distance| within_radius(distance, self.settings.max_radius_km))
            })
            .collect();

        if viewer_location.is_some() {
            matches.sort_by(|a, b| match (a.distance_km, b.distance_km) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }

        Ok(matches)
    }

    /// First acceptor wins. Losing a race is `AlreadyAssigned`, never a
    /// generic failure.
    pub fn accept(
        &self,
        request_id: RequestId,
        volunteer_id: ActorId,
    ) -> Result<HelpRequest, AppError> {
        let request = self.ledger.get(request_id)?;

        let role = self
            .directory
            .role(volunteer_id)
            .ok_or(AppError::ActorNotFound(volunteer_id))?;
        if !role.can_volunteer() {
            return Err(AppError::InvalidActor(format!(
                "actor {volunteer_id} is not registered as a volunteer"
            )));
        }
        if request.requester_id == volunteer_id {
            warn!(request_id, volunteer_id, "volunteer tried to accept own request");
            return Err(AppError::InvalidActor(
                "cannot accept your own help request".to_string(),
            ));
        }

        match self.ledger.try_assign(request_id, volunteer_id)? {
            AssignOutcome::Assigned(request) => Ok(request),
            AssignOutcome::AlreadyAssigned => Err(AppError::AlreadyAssigned(request_id)),
            AssignOutcome::NotFound => Err(AppError::NotFound(request_id)),
        }
    }

    fn rank_among(
        &self,
        request: &HelpRequest,
        available: &HashMap<ActorId, Coordinate>,
    ) -> Vec<RankedVolunteer> {
        let mut ranked = rank_volunteers(&request.origin, available, self.settings.max_radius_km);
        ranked.retain(|candidate| candidate.volunteer_id != request.requester_id);
        ranked.truncate(self.settings.ranking_limit);
        ranked
    }
}
