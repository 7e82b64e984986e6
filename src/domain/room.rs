//! Room: owns its optional Resident reference, inverse side of Facility → Room.

use super::{
    double_option, ids_of, require_text, validate_text, ChildOf, ColumnDef, EntityFields, EntityId, Facility,
    IdRef, ParentOf, Persisted, ResidentView, TableDef, TextRule,
};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

static ROOM_TABLE: TableDef = TableDef {
    name: "room",
    columns: &[
        ColumnDef::varchar("room_title"),
        ColumnDef::text("room_description"),
        ColumnDef::varchar("room_type"),
        ColumnDef::foreign_key("resident_id", "resident"),
    ],
};

const SHORT_TEXT: TextRule = TextRule::new().max(255);
const LONG_TEXT: TextRule = TextRule::new();

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_title: String,
    pub room_description: String,
    pub room_type: String,
    #[serde(default)]
    pub resident_id: Option<EntityId>,
}

impl EntityFields for Room {
    const ENTITY_NAME: &'static str = "room";

    fn table() -> &'static TableDef {
        &ROOM_TABLE
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_text("roomTitle", &self.room_title, SHORT_TEXT)?;
        validate_text("roomDescription", &self.room_description, LONG_TEXT)?;
        validate_text("roomType", &self.room_type, SHORT_TEXT)?;
        Ok(())
    }
}

impl ChildOf for Room {
    fn parent_column() -> &'static str {
        "resident_id"
    }

    fn parent(&self) -> Option<EntityId> {
        self.resident_id
    }

    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.resident_id = parent;
    }
}

impl ParentOf for Room {
    type Child = Facility;
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub room_title: Option<String>,
    #[serde(default)]
    pub room_description: Option<String>,
    #[serde(default)]
    pub room_type: Option<String>,
    /// Absent: unchanged on PATCH, cleared on PUT. `null`: detach.
    #[serde(default, deserialize_with = "double_option")]
    pub resident: Option<Option<IdRef>>,
    #[serde(default)]
    pub facilities: Option<Vec<IdRef>>,
}

impl RoomPayload {
    pub fn resident_id(&self) -> Option<EntityId> {
        self.resident.flatten().map(|r| r.id)
    }

    pub fn to_room(&self) -> Result<Room, AppError> {
        let room = Room {
            room_title: require_text("roomTitle", self.room_title.clone())?,
            room_description: require_text("roomDescription", self.room_description.clone())?,
            room_type: require_text("roomType", self.room_type.clone())?,
            resident_id: self.resident_id(),
        };
        room.validate()?;
        Ok(room)
    }

    pub fn merge_into(&self, target: &mut Room) {
        if let Some(title) = &self.room_title {
            target.room_title = title.clone();
        }
        if let Some(description) = &self.room_description {
            target.room_description = description.clone();
        }
        if let Some(room_type) = &self.room_type {
            target.room_type = room_type.clone();
        }
        if let Some(resident) = self.resident {
            target.resident_id = resident.map(|r| r.id);
        }
    }

    pub fn facility_ids(&self) -> Option<Vec<EntityId>> {
        self.facilities.as_deref().map(ids_of)
    }
}

/// Room as returned by the API: the resident is nested, facilities are not expanded.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: EntityId,
    pub room_title: String,
    pub room_description: String,
    pub room_type: String,
    pub resident: Option<ResidentView>,
}

impl RoomView {
    pub fn new(room: &Persisted<Room>, resident: Option<ResidentView>) -> Self {
        RoomView {
            id: room.id(),
            room_title: room.fields.room_title.clone(),
            room_description: room.fields.room_description.clone(),
            room_type: room.fields.room_type.clone(),
            resident,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> RoomPayload {
        serde_json::from_value(json).unwrap()
    }

    fn stored() -> Room {
        Room {
            room_title: "AAAAAAAAAA".into(),
            room_description: "AAAAAAAAAA".into(),
            room_type: "AAAAAAAAAA".into(),
            resident_id: Some(EntityId::new(4)),
        }
    }

    #[test]
    fn resident_reference_distinguishes_absent_and_null() {
        assert_eq!(payload(serde_json::json!({})).resident, None);
        assert_eq!(payload(serde_json::json!({ "resident": null })).resident, Some(None));
        assert_eq!(
            payload(serde_json::json!({ "resident": { "id": 2, "residentName": "ignored" } })).resident,
            Some(Some(IdRef { id: EntityId::new(2) }))
        );
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let mut room = stored();
        payload(serde_json::json!({ "roomTitle": "BBBBBBBBBB" })).merge_into(&mut room);
        assert_eq!(room.room_title, "BBBBBBBBBB");
        assert_eq!(room.room_description, "AAAAAAAAAA");
        assert_eq!(room.resident_id, Some(EntityId::new(4)));

        payload(serde_json::json!({ "resident": null })).merge_into(&mut room);
        assert_eq!(room.resident_id, None);
    }

    #[test]
    fn full_payload_requires_every_text_field() {
        let ok = payload(serde_json::json!({
            "roomTitle": "T", "roomDescription": "D", "roomType": "X", "resident": { "id": 9 }
        }))
        .to_room()
        .unwrap();
        assert_eq!(ok.resident_id, Some(EntityId::new(9)));

        for missing in ["roomTitle", "roomDescription", "roomType"] {
            let mut body = serde_json::json!({ "roomTitle": "T", "roomDescription": "D", "roomType": "X" });
            body.as_object_mut().unwrap().remove(missing);
            assert!(payload(body).to_room().is_err(), "{} should be required", missing);
        }
    }

    #[test]
    fn view_nests_resident() {
        let room = Persisted::new(EntityId::new(1), stored());
        let v = serde_json::to_value(RoomView::new(&room, None)).unwrap();
        assert_eq!(v["roomTitle"], "AAAAAAAAAA");
        assert!(v["resident"].is_null());
        assert!(v.get("facilities").is_none());
    }
}
