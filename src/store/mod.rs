//! Per-entity repositories and the storage handle shared by all routes.

mod memory;
mod postgres;
mod schema;

pub use memory::{MemoryParentRepository, MemoryRepository};
pub use postgres::PgRepository;
pub use schema::{ensure_database_exists, ensure_tables};

use crate::config::{Settings, StorageBackend};
use crate::domain::{EntityFields, EntityId, Facility, ParentOf, Persisted, Record, Resident, Room};
use crate::error::AppError;
use crate::query::ListQuery;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

/// One page of rows plus the number of rows in the whole table.
#[derive(Clone, Debug)]
pub struct Page<F> {
    pub items: Vec<Persisted<F>>,
    pub total: u64,
}

#[async_trait]
pub trait Repository<F: EntityFields>: Send + Sync {
    /// Rows in sort order (id ascending as tie-breaker); the requested slice when paged.
    async fn find_all(&self, query: &ListQuery) -> Result<Page<F>, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Persisted<F>>, AppError>;

    /// Rows whose id is in `ids`, ordered by id. Unknown ids are skipped.
    async fn find_all_by_id(&self, ids: &[EntityId]) -> Result<Vec<Persisted<F>>, AppError>;

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, AppError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Validates, then inserts an unsaved record or replaces every column of a saved one.
    /// Saving a record whose id has no row fails with `NotFound`.
    async fn save(&self, record: Record<F>) -> Result<Persisted<F>, AppError>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: EntityId) -> Result<bool, AppError>;
}

/// Inverse side of a one-to-many relation, implemented by the repository holding the foreign key.
#[async_trait]
pub trait ChildLinks: Send + Sync {
    /// Ids of children pointing at `parent`, ascending.
    async fn children_of(&self, parent: EntityId) -> Result<Vec<EntityId>, AppError>;

    /// Points every id in `children` at `parent` and detaches every other child of `parent`.
    /// Unknown child ids fail with `BadRequest` and nothing changes.
    async fn replace_children(&self, parent: EntityId, children: &[EntityId]) -> Result<(), AppError>;

    async fn detach_all(&self, parent: EntityId) -> Result<(), AppError> {
        self.replace_children(parent, &[]).await
    }
}

pub trait LinkedRepository<F: EntityFields>: Repository<F> + ChildLinks {}

impl<F: EntityFields, T: Repository<F> + ChildLinks + ?Sized> LinkedRepository<F> for T {}

/// Repository of a parent entity that can rewrite its inverse collection in the same write.
#[async_trait]
pub trait ParentRepository<P: ParentOf>: Repository<P> {
    /// `save`, then `replace_children` when `children` is given. Either both apply or nothing does:
    /// an unknown child fails with `BadRequest` and the parent row is left as it was.
    async fn save_with_children(
        &self,
        record: Record<P>,
        children: Option<&[EntityId]>,
    ) -> Result<Persisted<P>, AppError>;
}

/// Rooms are both a child (of a resident) and a parent (of facilities).
pub trait LinkedParentRepository<F: ParentOf>: ParentRepository<F> + ChildLinks {}

impl<F: ParentOf, T: ParentRepository<F> + ChildLinks + ?Sized> LinkedParentRepository<F> for T {}

#[derive(Clone)]
pub struct Store {
    pub residents: Arc<dyn ParentRepository<Resident>>,
    /// Also the inverse side of Room → Resident.
    pub rooms: Arc<dyn LinkedParentRepository<Room>>,
    /// Also the inverse side of Facility → Room.
    pub facilities: Arc<dyn LinkedRepository<Facility>>,
}

impl Store {
    /// Empty in-process store; ids start at 1 per table.
    pub fn memory() -> Self {
        let rooms = MemoryRepository::<Room>::new();
        let facilities = MemoryRepository::<Facility>::new();
        Store {
            residents: Arc::new(MemoryParentRepository::new(MemoryRepository::<Resident>::new(), rooms.clone())),
            rooms: Arc::new(MemoryParentRepository::new(rooms, facilities.clone())),
            facilities: Arc::new(facilities),
        }
    }

    /// Repositories over an existing pool. Tables must already exist in `schema`.
    pub fn postgres(pool: PgPool, schema: &str) -> Self {
        Store {
            residents: Arc::new(PgRepository::<Resident>::new(pool.clone(), schema)),
            rooms: Arc::new(PgRepository::<Room>::new(pool.clone(), schema)),
            facilities: Arc::new(PgRepository::<Facility>::new(pool, schema)),
        }
    }

    /// Opens the configured backend. For postgres: creates the database if missing, connects, creates tables.
    pub async fn open(settings: &Settings) -> Result<Self, AppError> {
        match settings.storage {
            StorageBackend::Memory => {
                tracing::info!("using in-memory storage");
                Ok(Store::memory())
            }
            StorageBackend::Postgres => {
                ensure_database_exists(&settings.database_url).await?;
                let pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .connect(&settings.database_url)
                    .await?;
                ensure_tables(&pool, &settings.schema).await?;
                tracing::info!(schema = %settings.schema, "postgres storage ready");
                Ok(Store::postgres(pool, &settings.schema))
            }
        }
    }
}
