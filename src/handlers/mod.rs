//! HTTP handlers for resident, room and facility CRUD.

pub mod facility;
pub mod resident;
pub mod room;
mod support;
