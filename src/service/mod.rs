//! Logic shared by the entity handlers: nested output views and relation checks.

mod relations;
mod views;

pub use relations::{ensure_all_exist, ensure_exists};
pub use views::{facility_view, facility_views, resident_views, room_view, room_views};
