//! Resident: inverse side of Room → Resident.

use super::{ids_of, require_text, validate_text, ColumnDef, EntityFields, EntityId, IdRef, ParentOf, Persisted, Room, TableDef, TextRule};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

static RESIDENT_TABLE: TableDef = TableDef {
    name: "resident",
    columns: &[
        ColumnDef::varchar("resident_name"),
        ColumnDef::varchar("resident_address"),
    ],
};

const NAME_RULE: TextRule = TextRule::new().min(3).max(255);
const ADDRESS_RULE: TextRule = TextRule::new().min(2).max(255);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub resident_name: String,
    pub resident_address: String,
}

impl EntityFields for Resident {
    const ENTITY_NAME: &'static str = "resident";

    fn table() -> &'static TableDef {
        &RESIDENT_TABLE
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_text("residentName", &self.resident_name, NAME_RULE)?;
        validate_text("residentAddress", &self.resident_address, ADDRESS_RULE)?;
        Ok(())
    }
}

impl ParentOf for Resident {
    type Child = Room;
}

/// Request body for POST, PUT and PATCH.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentPayload {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub resident_name: Option<String>,
    #[serde(default)]
    pub resident_address: Option<String>,
    /// When present, the complete set of rooms owned by this resident.
    #[serde(default)]
    pub rooms: Option<Vec<IdRef>>,
}

impl ResidentPayload {
    /// Full field set; every required field must be present.
    pub fn to_resident(&self) -> Result<Resident, AppError> {
        let resident = Resident {
            resident_name: require_text("residentName", self.resident_name.clone())?,
            resident_address: require_text("residentAddress", self.resident_address.clone())?,
        };
        resident.validate()?;
        Ok(resident)
    }

    /// Merge-patch: fields present and non-null overwrite, the rest keep their value.
    pub fn merge_into(&self, target: &mut Resident) {
        if let Some(name) = &self.resident_name {
            target.resident_name = name.clone();
        }
        if let Some(address) = &self.resident_address {
            target.resident_address = address.clone();
        }
    }

    pub fn room_ids(&self) -> Option<Vec<EntityId>> {
        self.rooms.as_deref().map(ids_of)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentView {
    pub id: EntityId,
    pub resident_name: String,
    pub resident_address: String,
}

impl From<&Persisted<Resident>> for ResidentView {
    fn from(p: &Persisted<Resident>) -> Self {
        ResidentView {
            id: p.id(),
            resident_name: p.fields.resident_name.clone(),
            resident_address: p.fields.resident_address.clone(),
        }
    }
}
