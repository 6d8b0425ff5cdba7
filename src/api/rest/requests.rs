use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::dispatch::{AcceptedRequest, PendingRequestView};
use crate::error::AppError;
use crate::models::actor::ActorId;
use crate::models::request::{HelpRequest, RequestId};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(submit_request))
        .route("/requests/pending", get(list_pending_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/accept", post(accept_request))
        .route("/requests/:id/complete", post(complete_request))
        .route("/requests/:id/cancel", post(cancel_request))
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub requester_id: ActorId,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct PendingQuery {
    pub volunteer_id: Option<ActorId>,
}

#[derive(Deserialize)]
pub struct AcceptRequest {
    pub volunteer_id: ActorId,
}

#[derive(Deserialize)]
pub struct ActorAction {
    pub actor_id: ActorId,
}

async fn submit_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<HelpRequest>, AppError> {
    let request = state.dispatch.submit_request(
        payload.requester_id,
        payload.latitude,
        payload.longitude,
        payload.recorded_at,
    )?;
    Ok(Json(request))
}

async fn list_pending_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<PendingRequestView>>, AppError> {
    Ok(Json(state.dispatch.list_pending_requests(query.volunteer_id)?))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
) -> Result<Json<HelpRequest>, AppError> {
    Ok(Json(state.dispatch.get_request(id)?))
}

async fn accept_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Json(payload): Json<AcceptRequest>,
) -> Result<Json<AcceptedRequest>, AppError> {
    Ok(Json(state.dispatch.accept_request(id, payload.volunteer_id)?))
}

async fn complete_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Json(payload): Json<ActorAction>,
) -> Result<Json<HelpRequest>, AppError> {
    Ok(Json(state.dispatch.complete_request(id, payload.actor_id)?))
}

async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Json(payload): Json<ActorAction>,
) -> Result<Json<HelpRequest>, AppError> {
    Ok(Json(state.dispatch.cancel_request(id, payload.actor_id)?))
}
