//! Repository and API tests against a live PostgreSQL.
//! Skipped unless `DATABASE_URL` is set; every test works in its own schema and drops it afterwards.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use residence_api::domain::{EntityId, Facility, Persisted, Record, Resident, Room};
use residence_api::query::{Direction, ListQuery, PageRequest, Sort};
use residence_api::store::{ChildLinks, ParentRepository, Repository};
use residence_api::{ensure_tables, AppError, Store};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

struct PgFixture {
    pool: PgPool,
    schema: String,
}

impl PgFixture {
    /// One pooled connection, so repeated statements reuse the same prepared statement.
    async fn start(name: &str) -> Option<Self> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL not set; skipping {}", name);
                return None;
            }
        };
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        let schema = format!("it_{}_{}", name, std::process::id());
        sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", schema))
            .execute(&pool)
            .await
            .unwrap();
        ensure_tables(&pool, &schema).await.unwrap();
        // a second run over existing tables is a no-op
        ensure_tables(&pool, &schema).await.unwrap();
        Some(PgFixture { pool, schema })
    }

    fn store(&self) -> Store {
        Store::postgres(self.pool.clone(), &self.schema)
    }

    async fn finish(self) {
        sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

fn resident(name: &str) -> Resident {
    Resident {
        resident_name: name.into(),
        resident_address: "AAAAAAAAAA".into(),
    }
}

fn room(title: &str, resident_id: Option<EntityId>) -> Room {
    Room {
        room_title: title.into(),
        room_description: "AAAAAAAAAA".into(),
        room_type: "AAAAAAAAAA".into(),
        resident_id,
    }
}

fn facility(name: &str, room_id: Option<EntityId>) -> Facility {
    Facility {
        facility_name: name.into(),
        room_id,
    }
}

#[tokio::test]
async fn foreign_key_can_follow_a_null_one() {
    let Some(db) = PgFixture::start("fk_null_then_set").await else { return };
    let store = db.store();

    let owner = store.residents.save(Record::Unsaved(resident("AAA"))).await.unwrap();
    let loose = store.rooms.save(Record::Unsaved(room("loose", None))).await.unwrap();
    let owned = store.rooms.save(Record::Unsaved(room("owned", Some(owner.id())))).await.unwrap();
    assert_eq!(loose.fields.resident_id, None);
    assert_eq!(owned.fields.resident_id, Some(owner.id()));

    store.facilities.save(Record::Unsaved(facility("Gym", None))).await.unwrap();
    let sauna = store
        .facilities
        .save(Record::Unsaved(facility("Sauna", Some(owned.id()))))
        .await
        .unwrap();
    assert_eq!(sauna.fields.room_id, Some(owned.id()));

    let cleared = store
        .rooms
        .save(Record::Saved(Persisted::new(owned.id(), room("owned", None))))
        .await
        .unwrap();
    assert_eq!(cleared.fields.resident_id, None);
    let set = store
        .rooms
        .save(Record::Saved(Persisted::new(loose.id(), room("loose", Some(owner.id())))))
        .await
        .unwrap();
    assert_eq!(set.fields.resident_id, Some(owner.id()));

    db.finish().await;
}

#[tokio::test]
async fn api_creates_room_with_resident_after_one_without() {
    let Some(db) = PgFixture::start("api_rooms").await else { return };
    let app = TestApp::with_store(db.store());

    let resident_id = app.create_resident("AAA", "AA").await;
    app.create_room("first", None).await;
    let room_id = app.create_room("second", Some(resident_id)).await;

    let response = app.get(&format!("/api/rooms/{}", room_id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resident"]["id"], json!(resident_id));

    let response = app
        .put(
            &format!("/api/rooms/{}", room_id),
            json!({ "id": room_id, "roomTitle": "second", "roomDescription": "D", "roomType": "T" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resident"], json!(null));

    let response = app
        .patch(&format!("/api/rooms/{}", room_id), json!({ "id": room_id, "resident": { "id": resident_id } }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resident"]["id"], json!(resident_id));

    db.finish().await;
}

#[tokio::test]
async fn unknown_child_rolls_back_the_whole_write() {
    let Some(db) = PgFixture::start("relink_rollback").await else { return };
    let store = db.store();

    let owner = store.residents.save(Record::Unsaved(resident("AAA"))).await.unwrap();
    let a = store.rooms.save(Record::Unsaved(room("a", Some(owner.id())))).await.unwrap();
    let b = store.rooms.save(Record::Unsaved(room("b", None))).await.unwrap();
    let ghost = EntityId::new(999_999);

    let err = store.rooms.replace_children(owner.id(), &[b.id(), ghost]).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(store.rooms.children_of(owner.id()).await.unwrap(), vec![a.id()]);

    let err = store
        .residents
        .save_with_children(Record::Unsaved(resident("BBB")), Some(&[b.id(), ghost]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(store.residents.count().await.unwrap(), 1);

    let err = store
        .residents
        .save_with_children(Record::Saved(Persisted::new(owner.id(), resident("CCC"))), Some(&[ghost]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let stored = store.residents.find_by_id(owner.id()).await.unwrap().unwrap();
    assert_eq!(stored.fields.resident_name, "AAA");
    assert_eq!(store.rooms.children_of(owner.id()).await.unwrap(), vec![a.id()]);

    store
        .residents
        .save_with_children(Record::Saved(Persisted::new(owner.id(), resident("DDD"))), Some(&[b.id()]))
        .await
        .unwrap();
    assert_eq!(store.rooms.children_of(owner.id()).await.unwrap(), vec![b.id()]);

    db.finish().await;
}

#[tokio::test]
async fn deleting_a_parent_detaches_children() {
    let Some(db) = PgFixture::start("delete_detaches").await else { return };
    let store = db.store();
    let app = TestApp::with_store(store.clone());

    let resident_id = app.create_resident("AAA", "AA").await;
    let room_id = app.create_room("kept", Some(resident_id)).await;
    let facility_id = app.create_facility("Gym", Some(room_id)).await;

    assert_eq!(app.delete(&format!("/api/residents/{}", resident_id)).await.status, StatusCode::NO_CONTENT);
    let response = app.get(&format!("/api/rooms/{}", room_id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resident"], json!(null));

    // the foreign key clears references even without the handler's detach step
    assert!(store.rooms.delete_by_id(EntityId::new(room_id)).await.unwrap());
    let gym = store.facilities.find_by_id(EntityId::new(facility_id)).await.unwrap().unwrap();
    assert_eq!(gym.fields.room_id, None);

    db.finish().await;
}

#[tokio::test]
async fn sorts_and_pages() {
    let Some(db) = PgFixture::start("sort_page").await else { return };
    let store = db.store();
    for name in ["CCC", "AAA", "BBB", "AAA"] {
        store.residents.save(Record::Unsaved(resident(name))).await.unwrap();
    }

    let query = ListQuery {
        sort: Sort::by("resident_name", Direction::Desc),
        page: Some(PageRequest { page: 1, size: 2 }),
    };
    let page = store.residents.find_all(&query).await.unwrap();
    assert_eq!(page.total, 4);
    let ids: Vec<i64> = page.items.iter().map(|p| p.id().get()).collect();
    assert_eq!(ids, vec![2, 4]);

    let found = store
        .residents
        .find_all_by_id(&[EntityId::new(3), EntityId::new(1), EntityId::new(77)])
        .await
        .unwrap();
    let ids: Vec<i64> = found.iter().map(|p| p.id().get()).collect();
    assert_eq!(ids, vec![1, 3]);

    db.finish().await;
}

#[tokio::test]
async fn constraint_violations_are_client_errors() {
    let Some(db) = PgFixture::start("constraints").await else { return };
    let store = db.store();

    let err = store
        .facilities
        .save(Record::Unsaved(facility("Gym", Some(EntityId::new(424_242)))))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let ghost = Persisted::new(EntityId::new(424_242), facility("Gym", None));
    let err = store.facilities.save(Record::Saved(ghost)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!store.facilities.delete_by_id(EntityId::new(424_242)).await.unwrap());

    db.finish().await;
}
