//! Output views. Owning references are expanded one way only (facility → room → resident);
//! inverse collections are never expanded.

use crate::domain::{EntityId, Facility, FacilityView, Persisted, Resident, ResidentView, Room, RoomView};
use crate::error::AppError;
use crate::store::Store;
use std::collections::HashMap;

fn referenced_ids(ids: impl Iterator<Item = Option<EntityId>>) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = ids.flatten().collect();
    ids.sort();
    ids.dedup();
    ids
}

pub fn resident_views(residents: &[Persisted<Resident>]) -> Vec<ResidentView> {
    residents.iter().map(ResidentView::from).collect()
}

/// Loads every referenced resident in one batch.
pub async fn room_views(store: &Store, rooms: &[Persisted<Room>]) -> Result<Vec<RoomView>, AppError> {
    let ids = referenced_ids(rooms.iter().map(|r| r.fields.resident_id));
    let residents: HashMap<EntityId, ResidentView> = store
        .residents
        .find_all_by_id(&ids)
        .await?
        .iter()
        .map(|r| (r.id(), ResidentView::from(r)))
        .collect();
    Ok(rooms
        .iter()
        .map(|room| {
            let resident = room.fields.resident_id.and_then(|id| residents.get(&id).cloned());
            RoomView::new(room, resident)
        })
        .collect())
}

pub async fn room_view(store: &Store, room: &Persisted<Room>) -> Result<RoomView, AppError> {
    let resident = match room.fields.resident_id {
        Some(id) => store.residents.find_by_id(id).await?,
        None => None,
    };
    Ok(RoomView::new(room, resident.as_ref().map(ResidentView::from)))
}

/// Loads referenced rooms, then their residents, one batch each.
pub async fn facility_views(store: &Store, facilities: &[Persisted<Facility>]) -> Result<Vec<FacilityView>, AppError> {
    let ids = referenced_ids(facilities.iter().map(|f| f.fields.room_id));
    let rooms = store.rooms.find_all_by_id(&ids).await?;
    let rooms: HashMap<EntityId, RoomView> = room_views(store, &rooms)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();
    Ok(facilities
        .iter()
        .map(|facility| {
            let room = facility.fields.room_id.and_then(|id| rooms.get(&id).cloned());
            FacilityView::new(facility, room)
        })
        .collect())
}

pub async fn facility_view(store: &Store, facility: &Persisted<Facility>) -> Result<FacilityView, AppError> {
    let room = match facility.fields.room_id {
        Some(id) => match store.rooms.find_by_id(id).await? {
            Some(room) => Some(room_view(store, &room).await?),
            None => None,
        },
        None => None,
    };
    Ok(FacilityView::new(facility, room))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;

    #[tokio::test]
    async fn facility_view_nests_room_and_resident() {
        let store = Store::memory();
        let resident = store
            .residents
            .save(Record::Unsaved(Resident {
                resident_name: "AAA".into(),
                resident_address: "AA".into(),
            }))
            .await
            .unwrap();
        let room = store
            .rooms
            .save(Record::Unsaved(Room {
                room_title: "T".into(),
                room_description: "D".into(),
                room_type: "X".into(),
                resident_id: Some(resident.id()),
            }))
            .await
            .unwrap();
        let facility = store
            .facilities
            .save(Record::Unsaved(Facility {
                facility_name: "F".into(),
                room_id: Some(room.id()),
            }))
            .await
            .unwrap();

        let single = facility_view(&store, &facility).await.unwrap();
        let batch = facility_views(&store, std::slice::from_ref(&facility)).await.unwrap();
        assert_eq!(batch, vec![single.clone()]);

        let json = serde_json::to_value(single).unwrap();
        assert_eq!(json["room"]["id"], room.id().get());
        assert_eq!(json["room"]["resident"]["residentName"], "AAA");
        assert!(json["room"].get("facilities").is_none());
        assert!(json["room"]["resident"].get("rooms").is_none());
    }

    #[tokio::test]
    async fn missing_reference_renders_as_null() {
        let store = Store::memory();
        let room = Persisted::new(
            EntityId::new(1),
            Room {
                room_title: "T".into(),
                room_description: "D".into(),
                room_type: "X".into(),
                resident_id: None,
            },
        );
        let views = room_views(&store, &[room]).await.unwrap();
        assert_eq!(views[0].resident, None);
    }
}
