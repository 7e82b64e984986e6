//! PostgreSQL repository. SQL comes from `crate::sql`; rows decode through JSON into the field struct.

use super::{ChildLinks, Page, ParentRepository, Repository};
use crate::case::to_camel_case;
use crate::domain::{ChildOf, EntityFields, EntityId, ParentOf, Persisted, Record, TableDef};
use crate::error::AppError;
use crate::query::ListQuery;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgDatabaseError, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Executor, PgConnection, PgPool, Postgres, Row};
use std::marker::PhantomData;

pub struct PgRepository<F> {
    pool: PgPool,
    schema: String,
    _fields: PhantomData<fn() -> F>,
}

impl<F: EntityFields> PgRepository<F> {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgRepository {
            pool,
            schema: schema.to_string(),
            _fields: PhantomData,
        }
    }

    fn table(&self) -> &'static TableDef {
        F::table()
    }

    async fn fetch_many(&self, q: &QueryBuf) -> Result<Vec<Persisted<F>>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bound(q).fetch_all(&self.pool).await.map_err(map_db_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn fetch_optional<'c, E>(executor: E, q: &QueryBuf) -> Result<Option<Persisted<F>>, AppError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bound(q).fetch_optional(executor).await.map_err(map_db_error)?;
        row.as_ref().map(decode_row).transpose()
    }

    /// INSERT or UPDATE of one row on `executor`.
    async fn write_row<'c, E>(&self, executor: E, record: &Record<F>) -> Result<Persisted<F>, AppError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let values = column_values(record.fields())?;
        match record.id() {
            None => {
                let q = sql::insert(self.table(), &self.schema, &values);
                Self::fetch_optional(executor, &q)
                    .await?
                    .ok_or(AppError::Db(sqlx::Error::RowNotFound))
            }
            Some(id) => {
                let q = sql::update(self.table(), &self.schema, id, &values);
                Self::fetch_optional(executor, &q)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("{} {}", F::ENTITY_NAME, id)))
            }
        }
    }
}

fn bound(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

/// Points `children` at `parent` and detaches its other children, on a connection inside a transaction.
/// The listed rows are locked first; a missing one fails with `BadRequest` before anything is updated.
async fn relink_children<C: ChildOf>(
    conn: &mut PgConnection,
    schema: &str,
    parent: EntityId,
    children: &[EntityId],
) -> Result<(), AppError> {
    let table = C::table();
    let ids: Vec<i64> = children.iter().map(|id| id.get()).collect();

    if !ids.is_empty() {
        let stmt = sql::lock_ids(table, schema);
        tracing::debug!(sql = %stmt, ids = ?ids, "query (tx)");
        let found: Vec<i64> = sqlx::query_scalar(&stmt)
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_db_error)?;
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(AppError::BadRequest(format!("{} {} does not exist", C::ENTITY_NAME, missing)));
        }
    }

    let detach = sql::detach_children_except(table, schema, C::parent_column());
    tracing::debug!(sql = %detach, parent = %parent, "query (tx)");
    sqlx::query(&detach)
        .bind(parent.get())
        .bind(&ids)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;

    if !ids.is_empty() {
        let attach = sql::attach_children(table, schema, C::parent_column());
        tracing::debug!(sql = %attach, parent = %parent, "query (tx)");
        sqlx::query(&attach)
            .bind(parent.get())
            .bind(&ids)
            .execute(&mut *conn)
            .await
            .map_err(map_db_error)?;
    }
    Ok(())
}

/// Column-keyed map of every declared column, as bound by INSERT and UPDATE.
fn column_values<F: EntityFields>(fields: &F) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(fields) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::Validation(format!("{} must serialize to an object", F::ENTITY_NAME))),
        Err(e) => Err(AppError::Validation(e.to_string())),
    }
}

fn decode_row<F: EntityFields>(row: &PgRow) -> Result<Persisted<F>, AppError> {
    let mut map = row_to_json(row);
    let id = map
        .remove(TableDef::PK)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| AppError::Db(sqlx::Error::ColumnNotFound(TableDef::PK.into())))?;
    let fields: F =
        serde_json::from_value(Value::Object(map)).map_err(|e| AppError::Db(sqlx::Error::Decode(Box::new(e))))?;
    Ok(Persisted::new(EntityId::new(id), fields))
}

fn row_to_json(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

/// Tables only hold BIGINT and text columns.
fn cell_to_value(row: &PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    Value::Null
}

/// Constraint violations are client errors; everything else stays a storage failure.
fn map_db_error(e: sqlx::Error) -> AppError {
    let (code, column) = match e.as_database_error() {
        Some(db) => (
            db.code().map(|c| c.into_owned()),
            db.try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.column())
                .map(to_camel_case),
        ),
        None => (None, None),
    };
    match code.as_deref() {
        Some("23503") => AppError::BadRequest("referenced entity does not exist".into()),
        Some("23502") => AppError::Validation(format!("{} is required", column.as_deref().unwrap_or("field"))),
        Some("22001") => AppError::Validation("value too long".into()),
        _ => AppError::Db(e),
    }
}

#[async_trait]
impl<F: EntityFields> Repository<F> for PgRepository<F> {
    async fn find_all(&self, query: &ListQuery) -> Result<Page<F>, AppError> {
        let limit = query.page.map(|p| p.size);
        let offset = query.page.map(|p| p.offset());
        let q = sql::select_list(self.table(), &self.schema, &query.sort, limit, offset);
        let items = self.fetch_many(&q).await?;
        let total = self.count().await?;
        Ok(Page { items, total })
    }

    async fn count(&self) -> Result<u64, AppError> {
        let q = sql::count(self.table(), &self.schema);
        tracing::debug!(sql = %q.sql, "query");
        let n: i64 = sqlx::query_scalar(&q.sql).fetch_one(&self.pool).await.map_err(map_db_error)?;
        Ok(n.max(0) as u64)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Persisted<F>>, AppError> {
        let q = sql::select_by_id(self.table(), &self.schema, id);
        Self::fetch_optional(&self.pool, &q).await
    }

    async fn find_all_by_id(&self, ids: &[EntityId]) -> Result<Vec<Persisted<F>>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = sql::select_by_ids(self.table(), &self.schema, ids);
        self.fetch_many(&q).await
    }

    async fn save(&self, record: Record<F>) -> Result<Persisted<F>, AppError> {
        record.fields().validate()?;
        self.write_row(&self.pool, &record).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, AppError> {
        let q = sql::delete(self.table(), &self.schema, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let result = bound(&q)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl<F: ChildOf> ChildLinks for PgRepository<F> {
    async fn children_of(&self, parent: EntityId) -> Result<Vec<EntityId>, AppError> {
        let stmt = sql::select_children(self.table(), &self.schema, F::parent_column());
        tracing::debug!(sql = %stmt, parent = %parent, "query");
        let ids: Vec<i64> = sqlx::query_scalar(&stmt)
            .bind(parent.get())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(ids.into_iter().map(EntityId::new).collect())
    }

    async fn replace_children(&self, parent: EntityId, children: &[EntityId]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        relink_children::<F>(&mut tx, &self.schema, parent, children).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<P: ParentOf> ParentRepository<P> for PgRepository<P> {
    async fn save_with_children(
        &self,
        record: Record<P>,
        children: Option<&[EntityId]>,
    ) -> Result<Persisted<P>, AppError> {
        record.fields().validate()?;
        let mut tx = self.pool.begin().await?;
        let saved = self.write_row(&mut *tx, &record).await?;
        if let Some(ids) = children {
            relink_children::<P::Child>(&mut tx, &self.schema, saved.id(), ids).await?;
        }
        tx.commit().await?;
        Ok(saved)
    }
}
