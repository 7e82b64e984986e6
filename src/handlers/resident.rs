//! /api/residents handlers.

use super::support::{check_existing, check_new, not_found_as_id_error, parse_body, parse_id};
use crate::domain::{EntityFields, Persisted, Record, Resident, ResidentPayload, ResidentView, Room};
use crate::error::AppError;
use crate::query::ListQuery;
use crate::response::{entity_created_headers, entity_deleted_headers, entity_updated_headers, list_headers};
use crate::service::{ensure_all_exist, resident_views};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

const BASE_PATH: &str = "/api/residents";
const ENTITY: &str = Resident::ENTITY_NAME;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let (query, carried) = ListQuery::from_params(&params, Resident::table())?;
    let page = state.store.residents.find_all(&query).await?;
    let headers = list_headers(BASE_PATH, query.page, page.total, &carried);
    Ok((StatusCode::OK, headers, Json(resident_views(&page.items))))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let resident = state
        .store
        .residents
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", ENTITY, id)))?;
    Ok(Json(ResidentView::from(&resident)))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload: ResidentPayload = parse_body(body)?;
    check_new(ENTITY, payload.id)?;
    let fields = payload.to_resident()?;
    let rooms = payload.room_ids();
    if let Some(ids) = &rooms {
        ensure_all_exist::<Room, _>(&*state.store.rooms, ids).await?;
    }

    let saved = state
        .store
        .residents
        .save_with_children(Record::Unsaved(fields), rooms.as_deref())
        .await?;
    tracing::info!(entity = ENTITY, id = %saved.id(), "created");

    let location = format!("{}/{}", BASE_PATH, saved.id());
    let headers = entity_created_headers(ENTITY, saved.id(), &location);
    Ok((StatusCode::CREATED, headers, Json(ResidentView::from(&saved))))
}

/// PUT: full replace. Omitted fields are not preserved; an omitted `rooms` leaves links untouched.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = parse_id(&id_str)?;
    let payload: ResidentPayload = parse_body(body)?;
    let id = check_existing(ENTITY, path_id, payload.id)?;
    if !state.store.residents.exists_by_id(id).await? {
        return Err(AppError::id_not_found(ENTITY));
    }
    let fields = payload.to_resident()?;
    let rooms = payload.room_ids();
    if let Some(ids) = &rooms {
        ensure_all_exist::<Room, _>(&*state.store.rooms, ids).await?;
    }

    let saved = state
        .store
        .residents
        .save_with_children(Record::Saved(Persisted::new(id, fields)), rooms.as_deref())
        .await
        .map_err(|e| not_found_as_id_error(ENTITY, e))?;
    tracing::info!(entity = ENTITY, id = %id, "updated");

    Ok((StatusCode::OK, entity_updated_headers(ENTITY, id), Json(ResidentView::from(&saved))))
}

/// PATCH: fields present and non-null overwrite the stored ones.
pub async fn partial_update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = parse_id(&id_str)?;
    let payload: ResidentPayload = parse_body(body)?;
    let id = check_existing(ENTITY, path_id, payload.id)?;
    let mut existing = state
        .store
        .residents
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::id_not_found(ENTITY))?;
    payload.merge_into(&mut existing.fields);
    let rooms = payload.room_ids();
    if let Some(ids) = &rooms {
        ensure_all_exist::<Room, _>(&*state.store.rooms, ids).await?;
    }

    let saved = state
        .store
        .residents
        .save_with_children(Record::Saved(existing), rooms.as_deref())
        .await
        .map_err(|e| not_found_as_id_error(ENTITY, e))?;
    tracing::info!(entity = ENTITY, id = %id, "patched");

    Ok((StatusCode::OK, entity_updated_headers(ENTITY, id), Json(ResidentView::from(&saved))))
}

/// Always 204. Rooms owned by the resident are detached first.
pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.store.rooms.detach_all(id).await?;
    let removed = state.store.residents.delete_by_id(id).await?;
    tracing::info!(entity = ENTITY, id = %id, removed, "deleted");
    Ok((StatusCode::NO_CONTENT, entity_deleted_headers(ENTITY, id)))
}
