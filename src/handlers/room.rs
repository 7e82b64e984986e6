//! /api/rooms handlers.

use super::support::{check_existing, check_new, not_found_as_id_error, parse_body, parse_id};
use crate::domain::{EntityFields, EntityId, Facility, Persisted, Record, Resident, Room, RoomPayload};
use crate::error::AppError;
use crate::query::ListQuery;
use crate::response::{entity_created_headers, entity_deleted_headers, entity_updated_headers, list_headers};
use crate::service::{ensure_all_exist, ensure_exists, room_view, room_views};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

const BASE_PATH: &str = "/api/rooms";
const ENTITY: &str = Room::ENTITY_NAME;

/// Checks the resident reference and the facility list before anything is written.
async fn check_relations(state: &AppState, room: &Room, facilities: Option<&[EntityId]>) -> Result<(), AppError> {
    ensure_exists::<Resident, _>(&*state.store.residents, room.resident_id).await?;
    if let Some(ids) = facilities {
        ensure_all_exist::<Facility, _>(&*state.store.facilities, ids).await?;
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let (query, carried) = ListQuery::from_params(&params, Room::table())?;
    let page = state.store.rooms.find_all(&query).await?;
    let views = room_views(&state.store, &page.items).await?;
    let headers = list_headers(BASE_PATH, query.page, page.total, &carried);
    Ok((StatusCode::OK, headers, Json(views)))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let room = state
        .store
        .rooms
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", ENTITY, id)))?;
    Ok(Json(room_view(&state.store, &room).await?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload: RoomPayload = parse_body(body)?;
    check_new(ENTITY, payload.id)?;
    let fields = payload.to_room()?;
    let facilities = payload.facility_ids();
    check_relations(&state, &fields, facilities.as_deref()).await?;

    let saved = state
        .store
        .rooms
        .save_with_children(Record::Unsaved(fields), facilities.as_deref())
        .await?;
    tracing::info!(entity = ENTITY, id = %saved.id(), "created");

    let location = format!("{}/{}", BASE_PATH, saved.id());
    let headers = entity_created_headers(ENTITY, saved.id(), &location);
    Ok((StatusCode::CREATED, headers, Json(room_view(&state.store, &saved).await?)))
}

/// PUT: full replace; an omitted `resident` clears the link, an omitted `facilities` leaves them.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = parse_id(&id_str)?;
    let payload: RoomPayload = parse_body(body)?;
    let id = check_existing(ENTITY, path_id, payload.id)?;
    if !state.store.rooms.exists_by_id(id).await? {
        return Err(AppError::id_not_found(ENTITY));
    }
    let fields = payload.to_room()?;
    let facilities = payload.facility_ids();
    check_relations(&state, &fields, facilities.as_deref()).await?;

    let saved = state
        .store
        .rooms
        .save_with_children(Record::Saved(Persisted::new(id, fields)), facilities.as_deref())
        .await
        .map_err(|e| not_found_as_id_error(ENTITY, e))?;
    tracing::info!(entity = ENTITY, id = %id, "updated");

    Ok((
        StatusCode::OK,
        entity_updated_headers(ENTITY, id),
        Json(room_view(&state.store, &saved).await?),
    ))
}

/// PATCH: present non-null fields overwrite; `"resident": null` detaches, an absent one keeps the link.
pub async fn partial_update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = parse_id(&id_str)?;
    let payload: RoomPayload = parse_body(body)?;
    let id = check_existing(ENTITY, path_id, payload.id)?;
    let mut existing = state
        .store
        .rooms
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::id_not_found(ENTITY))?;
    payload.merge_into(&mut existing.fields);
    let facilities = payload.facility_ids();
    check_relations(&state, &existing.fields, facilities.as_deref()).await?;

    let saved = state
        .store
        .rooms
        .save_with_children(Record::Saved(existing), facilities.as_deref())
        .await
        .map_err(|e| not_found_as_id_error(ENTITY, e))?;
    tracing::info!(entity = ENTITY, id = %id, "patched");

    Ok((
        StatusCode::OK,
        entity_updated_headers(ENTITY, id),
        Json(room_view(&state.store, &saved).await?),
    ))
}

/// Always 204. Facilities in the room are detached first.
pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.store.facilities.detach_all(id).await?;
    let removed = state.store.rooms.delete_by_id(id).await?;
    tracing::info!(entity = ENTITY, id = %id, removed, "deleted");
    Ok((StatusCode::NO_CONTENT, entity_deleted_headers(ENTITY, id)))
}
