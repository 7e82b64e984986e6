//! REST backend for residents, rooms and facilities.

pub mod case;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{Settings, StorageBackend};
pub use error::{AppError, ConfigError};
pub use routes::{api_routes, common_routes, router};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, Store};
