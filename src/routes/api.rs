//! Entity routes under /api. PUT and PATCH only exist on item paths; on collections they answer 405.

use crate::handlers::{facility, resident, room};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/residents", get(resident::list).post(resident::create))
        .route(
            "/api/residents/:id",
            get(resident::read)
                .put(resident::update)
                .patch(resident::partial_update)
                .delete(resident::delete),
        )
        .route("/api/rooms", get(room::list).post(room::create))
        .route(
            "/api/rooms/:id",
            get(room::read)
                .put(room::update)
                .patch(room::partial_update)
                .delete(room::delete),
        )
        .route("/api/facilities", get(facility::list).post(facility::create))
        .route(
            "/api/facilities/:id",
            get(facility::read)
                .put(facility::update)
                .patch(facility::partial_update)
                .delete(facility::delete),
        )
        .with_state(state)
}
