//! Request parsing and identifier rules shared by the entity handlers.

use crate::domain::EntityId;
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn parse_id(id_str: &str) -> Result<EntityId, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", id_str)))
}

/// Body must be a JSON object that deserializes into `T`. Failures are 400 except an over-limit body (413).
pub fn parse_body<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        _ => AppError::BadRequest(rejection.body_text()),
    })?;
    if !value.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("invalid body: {}", e)))
}

/// POST: the client never supplies the id.
pub fn check_new(entity: &'static str, body_id: Option<EntityId>) -> Result<(), AppError> {
    match body_id {
        Some(_) => Err(AppError::id_exists(entity)),
        None => Ok(()),
    }
}

/// PUT/PATCH: the body id is required and must match the path.
pub fn check_existing(entity: &'static str, path_id: EntityId, body_id: Option<EntityId>) -> Result<EntityId, AppError> {
    match body_id {
        None => Err(AppError::id_null(entity)),
        Some(id) if id != path_id => Err(AppError::id_invalid(entity)),
        Some(id) => Ok(id),
    }
}

/// A saved record vanished between the existence check and the write.
pub fn not_found_as_id_error(entity: &'static str, err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::id_not_found(entity),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdErrorKey;

    fn key(err: AppError) -> Option<IdErrorKey> {
        match err {
            AppError::Identifier { key, .. } => Some(key),
            _ => None,
        }
    }

    #[test]
    fn identifier_rules() {
        let one = EntityId::new(1);
        assert!(check_new("resident", None).is_ok());
        assert_eq!(key(check_new("resident", Some(one)).unwrap_err()), Some(IdErrorKey::Exists));
        assert_eq!(key(check_existing("resident", one, None).unwrap_err()), Some(IdErrorKey::Null));
        assert_eq!(
            key(check_existing("resident", one, Some(EntityId::new(2))).unwrap_err()),
            Some(IdErrorKey::Invalid)
        );
        assert_eq!(check_existing("resident", one, Some(one)).unwrap(), one);
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
        assert_eq!(parse_id("12").unwrap(), EntityId::new(12));
    }

    #[test]
    fn body_must_be_an_object() {
        let err = parse_body::<Value>(Ok(Json(serde_json::json!([1, 2])))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
