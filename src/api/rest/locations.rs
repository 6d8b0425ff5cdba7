use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::LocationAck;
use crate::error::AppError;
use crate::models::actor::ActorId;
use crate::models::coordinate::Coordinate;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/locations", post(report_location))
        .route("/actors/:id/location", get(last_known_location))
        .route("/actors/:id/locations", get(location_history))
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub actor_id: ActorId,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct LastKnownLocation {
    pub actor_id: ActorId,
    pub location: Option<Coordinate>,
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<Json<LocationAck>, AppError> {
    let ack = state.dispatch.report_location(
        payload.actor_id,
        payload.latitude,
        payload.longitude,
        payload.recorded_at,
    )?;
    Ok(Json(ack))
}

async fn last_known_location(
    State(state): State<Arc<AppState>>,
    Path(actor_id): Path<ActorId>,
) -> Result<Json<LastKnownLocation>, AppError> {
    let location = state.dispatch.last_known_location(actor_id)?;
    Ok(Json(LastKnownLocation { actor_id, location }))
}

async fn location_history(
    State(state): State<Arc<AppState>>,
    Path(actor_id): Path<ActorId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Coordinate>>, AppError> {
    if query.limit == Some(0) {
        return Err(AppError::BadRequest("limit must be > 0".to_string()));
    }

    Ok(Json(state.dispatch.location_history(actor_id, query.limit)?))
}
