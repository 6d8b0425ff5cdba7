//! Directory maintenance routes. Account registration proper happens in the
//! identity service; these only mirror what the dispatch core reads.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::actor::{Actor, ActorId, ContactInfo, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/actors/:id", put(upsert_actor).get(get_actor))
        .route("/actors/:id/role", patch(update_role))
}

#[derive(Deserialize)]
pub struct UpsertActorRequest {
    pub role: Role,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

async fn upsert_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActorId>,
    Json(payload): Json<UpsertActorRequest>,
) -> Result<Json<Actor>, AppError> {
    let email = non_blank(payload.email, "email")?;
    let phone_number = non_blank(payload.phone_number, "phone_number")?;

    let actor = state.directory.upsert(Actor {
        id,
        role: payload.role,
        contact: ContactInfo {
            email,
            phone_number,
        },
    });
    Ok(Json(actor))
}

async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActorId>,
) -> Result<Json<Actor>, AppError> {
    state
        .directory
        .get(id)
        .map(Json)
        .ok_or(AppError::ActorNotFound(id))
}

async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActorId>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(state.directory.set_role(id, payload.role)?))
}

fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        Some(raw) if raw.trim().is_empty() => {
            Err(AppError::BadRequest(format!("{field} cannot be empty")))
        }
        Some(raw) => Ok(Some(raw.trim().to_string())),
        None => Ok(None),
    }
}
