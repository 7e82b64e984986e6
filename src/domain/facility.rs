//! Facility: owns its optional Room reference.

use super::{
    double_option, require_text, validate_text, ChildOf, ColumnDef, EntityFields, EntityId, IdRef, Persisted,
    RoomView, TableDef, TextRule,
};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

static FACILITY_TABLE: TableDef = TableDef {
    name: "facility",
    columns: &[
        ColumnDef::varchar("facility_name"),
        ColumnDef::foreign_key("room_id", "room"),
    ],
};

const NAME_RULE: TextRule = TextRule::new().max(255);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub facility_name: String,
    #[serde(default)]
    pub room_id: Option<EntityId>,
}

impl EntityFields for Facility {
    const ENTITY_NAME: &'static str = "facility";

    fn table() -> &'static TableDef {
        &FACILITY_TABLE
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_text("facilityName", &self.facility_name, NAME_RULE)
    }
}

impl ChildOf for Facility {
    fn parent_column() -> &'static str {
        "room_id"
    }

    fn parent(&self) -> Option<EntityId> {
        self.room_id
    }

    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.room_id = parent;
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityPayload {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub facility_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub room: Option<Option<IdRef>>,
}

impl FacilityPayload {
    pub fn room_id(&self) -> Option<EntityId> {
        self.room.flatten().map(|r| r.id)
    }

    pub fn to_facility(&self) -> Result<Facility, AppError> {
        let facility = Facility {
            facility_name: require_text("facilityName", self.facility_name.clone())?,
            room_id: self.room_id(),
        };
        facility.validate()?;
        Ok(facility)
    }

    pub fn merge_into(&self, target: &mut Facility) {
        if let Some(name) = &self.facility_name {
            target.facility_name = name.clone();
        }
        if let Some(room) = self.room {
            target.room_id = room.map(|r| r.id);
        }
    }
}

/// Facility as returned by the API, with its room (and that room's resident) nested.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityView {
    pub id: EntityId,
    pub facility_name: String,
    pub room: Option<RoomView>,
}

impl FacilityView {
    pub fn new(facility: &Persisted<Facility>, room: Option<RoomView>) -> Self {
        FacilityView {
            id: facility.id(),
            facility_name: facility.fields.facility_name.clone(),
            room,
        }
    }
}
