//! Entity shapes: Resident, Room, Facility, their saved/unsaved state and validation.

mod facility;
mod record;
mod resident;
mod room;
mod schema;
mod validation;

pub use facility::{Facility, FacilityPayload, FacilityView};
pub use record::{EntityId, Persisted, Record};
pub use resident::{Resident, ResidentPayload, ResidentView};
pub use room::{Room, RoomPayload, RoomView};
pub use schema::{ColumnDef, TableDef};
pub use validation::{require_text, validate_text, TextRule};

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Field set of one entity type. Serializes with column names as keys.
pub trait EntityFields: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Lowercase entity name used in alerts and error details (e.g. "resident").
    const ENTITY_NAME: &'static str;

    fn table() -> &'static TableDef;

    /// Checks every declared constraint; the first violation names its field.
    fn validate(&self) -> Result<(), AppError>;
}

/// Owning side of a one-to-many relation: the foreign key lives on this entity.
pub trait ChildOf: EntityFields {
    fn parent_column() -> &'static str;
    fn parent(&self) -> Option<EntityId>;
    fn set_parent(&mut self, parent: Option<EntityId>);
}

/// Inverse side of a one-to-many relation: rows of `Child` point at this entity.
pub trait ParentOf: EntityFields {
    type Child: ChildOf;
}

/// Reference to another entity in request bodies: `{ "id": n }`. Other keys are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct IdRef {
    pub id: EntityId,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn ids_of(refs: &[IdRef]) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = refs.iter().map(|r| r.id).collect();
    ids.sort();
    ids.dedup();
    ids
}
