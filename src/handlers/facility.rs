//! /api/facilities handlers.

use super::support::{check_existing, check_new, not_found_as_id_error, parse_body, parse_id};
use crate::domain::{EntityFields, Facility, FacilityPayload, Persisted, Record, Room};
use crate::error::AppError;
use crate::query::ListQuery;
use crate::response::{entity_created_headers, entity_deleted_headers, entity_updated_headers, list_headers};
use crate::service::{ensure_exists, facility_view, facility_views};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

const BASE_PATH: &str = "/api/facilities";
const ENTITY: &str = Facility::ENTITY_NAME;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let (query, carried) = ListQuery::from_params(&params, Facility::table())?;
    let page = state.store.facilities.find_all(&query).await?;
    let views = facility_views(&state.store, &page.items).await?;
    let headers = list_headers(BASE_PATH, query.page, page.total, &carried);
    Ok((StatusCode::OK, headers, Json(views)))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let facility = state
        .store
        .facilities
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", ENTITY, id)))?;
    Ok(Json(facility_view(&state.store, &facility).await?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload: FacilityPayload = parse_body(body)?;
    check_new(ENTITY, payload.id)?;
    let fields = payload.to_facility()?;
    ensure_exists::<Room, _>(&*state.store.rooms, fields.room_id).await?;

    let saved = state.store.facilities.save(Record::Unsaved(fields)).await?;
    tracing::info!(entity = ENTITY, id = %saved.id(), "created");

    let location = format!("{}/{}", BASE_PATH, saved.id());
    let headers = entity_created_headers(ENTITY, saved.id(), &location);
    Ok((StatusCode::CREATED, headers, Json(facility_view(&state.store, &saved).await?)))
}

/// PUT: full replace; an omitted `room` clears the link.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = parse_id(&id_str)?;
    let payload: FacilityPayload = parse_body(body)?;
    let id = check_existing(ENTITY, path_id, payload.id)?;
    if !state.store.facilities.exists_by_id(id).await? {
        return Err(AppError::id_not_found(ENTITY));
    }
    let fields = payload.to_facility()?;
    ensure_exists::<Room, _>(&*state.store.rooms, fields.room_id).await?;

    let saved = state
        .store
        .facilities
        .save(Record::Saved(Persisted::new(id, fields)))
        .await
        .map_err(|e| not_found_as_id_error(ENTITY, e))?;
    tracing::info!(entity = ENTITY, id = %id, "updated");

    Ok((
        StatusCode::OK,
        entity_updated_headers(ENTITY, id),
        Json(facility_view(&state.store, &saved).await?),
    ))
}

pub async fn partial_update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = parse_id(&id_str)?;
    let payload: FacilityPayload = parse_body(body)?;
    let id = check_existing(ENTITY, path_id, payload.id)?;
    let mut existing = state
        .store
        .facilities
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::id_not_found(ENTITY))?;
    payload.merge_into(&mut existing.fields);
    ensure_exists::<Room, _>(&*state.store.rooms, existing.fields.room_id).await?;

    let saved = state
        .store
        .facilities
        .save(Record::Saved(existing))
        .await
        .map_err(|e| not_found_as_id_error(ENTITY, e))?;
    tracing::info!(entity = ENTITY, id = %id, "patched");

    Ok((
        StatusCode::OK,
        entity_updated_headers(ENTITY, id),
        Json(facility_view(&state.store, &saved).await?),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let removed = state.store.facilities.delete_by_id(id).await?;
    tracing::info!(entity = ENTITY, id = %id, removed, "deleted");
    Ok((StatusCode::NO_CONTENT, entity_deleted_headers(ENTITY, id)))
}
