//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and DDL from static table definitions.

use super::params::PgBindValue;
use crate::domain::{EntityId, TableDef};
use crate::query::Sort;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from table definitions).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// `id` followed by every declared column.
fn select_column_list(table: &TableDef) -> String {
    std::iter::once(TableDef::PK)
        .chain(table.columns.iter().map(|c| c.name))
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_param(id: EntityId) -> PgBindValue {
    PgBindValue::id(id.get())
}

/// SELECT by primary key.
pub fn select_by_id(table: &TableDef, schema: &str, id: EntityId) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id_param(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}::bigint",
        select_column_list(table),
        qualified_table(schema, table.name),
        quoted(TableDef::PK),
        n
    );
    q
}

/// SELECT rows whose id is one of `ids`, ordered by id. Used for batch-loading related rows.
pub fn select_by_ids(table: &TableDef, schema: &str, ids: &[EntityId]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = select_column_list(table);
    let q_table = qualified_table(schema, table.name);
    if ids.is_empty() {
        q.sql = format!("SELECT {} FROM {} WHERE 1 = 0", cols, q_table);
        return q;
    }
    let placeholders: Vec<String> = ids
        .iter()
        .map(|id| format!("${}::bigint", q.push_param(id_param(*id))))
        .collect();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {}",
        cols,
        q_table,
        quoted(TableDef::PK),
        placeholders.join(", "),
        quoted(TableDef::PK)
    );
    q
}

/// SELECT every row with ORDER BY from `sort` (id as tie-breaker) and optional LIMIT/OFFSET.
pub fn select_list(table: &TableDef, schema: &str, sort: &Sort, limit: Option<u32>, offset: Option<u64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let order_clause = sort
        .orders_with_tiebreak()
        .iter()
        .filter(|o| table.has_column(&o.column))
        .map(|o| format!("{} {}", quoted(&o.column), o.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}{}{}",
        select_column_list(table),
        qualified_table(schema, table.name),
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

pub fn count(table: &TableDef, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", qualified_table(schema, table.name));
    q
}

/// INSERT every declared column; missing values bind as NULL. The id comes from the identity column.
pub fn insert(table: &TableDef, schema: &str, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.columns {
        let val = values.get(c.name).unwrap_or(&Value::Null);
        let n = q.push_param(PgBindValue::for_column(c, val));
        cols.push(quoted(c.name));
        placeholders.push(format!("${}::{}", n, c.cast_type));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(schema, table.name),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(table)
    );
    q
}

/// UPDATE by id: SET every declared column (full replace). Returns no row when the id is unknown.
pub fn update(table: &TableDef, schema: &str, id: EntityId, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in table.columns {
        let val = values.get(c.name).unwrap_or(&Value::Null);
        let n = q.push_param(PgBindValue::for_column(c, val));
        sets.push(format!("{} = ${}::{}", quoted(c.name), n, c.cast_type));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let n = q.push_param(id_param(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}::bigint RETURNING {}",
        qualified_table(schema, table.name),
        sets.join(", "),
        quoted(TableDef::PK),
        n,
        select_column_list(table)
    );
    q
}

/// DELETE by id.
pub fn delete(table: &TableDef, schema: &str, id: EntityId) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id_param(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${}::bigint",
        qualified_table(schema, table.name),
        quoted(TableDef::PK),
        n
    );
    q
}

/// Ids of rows whose `parent_column` equals `$1`. Bind the parent id.
pub fn select_children(table: &TableDef, schema: &str, parent_column: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1 ORDER BY {}",
        quoted(TableDef::PK),
        qualified_table(schema, table.name),
        quoted(parent_column),
        quoted(TableDef::PK)
    )
}

/// Clears `parent_column` on children of `$1` whose id is not in the `$2` array.
pub fn detach_children_except(table: &TableDef, schema: &str, parent_column: &str) -> String {
    format!(
        "UPDATE {} SET {} = NULL, {} = NOW() WHERE {} = $1 AND NOT ({} = ANY($2))",
        qualified_table(schema, table.name),
        quoted(parent_column),
        quoted("updated_at"),
        quoted(parent_column),
        quoted(TableDef::PK)
    )
}

/// Points every row in the `$2` array at parent `$1`.
pub fn attach_children(table: &TableDef, schema: &str, parent_column: &str) -> String {
    format!(
        "UPDATE {} SET {} = $1, {} = NOW() WHERE {} = ANY($2)",
        qualified_table(schema, table.name),
        quoted(parent_column),
        quoted("updated_at"),
        quoted(TableDef::PK)
    )
}

/// Ids from the `$1` array that exist, locked until the transaction ends.
pub fn lock_ids(table: &TableDef, schema: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ANY($1) FOR UPDATE",
        quoted(TableDef::PK),
        qualified_table(schema, table.name),
        quoted(TableDef::PK)
    )
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))
}

/// CREATE TABLE IF NOT EXISTS with identity id, declared columns, audit timestamps and foreign keys.
/// Foreign keys use ON DELETE SET NULL so a deleted parent never leaves a dangling reference.
pub fn create_table(table: &TableDef, schema: &str) -> String {
    let mut col_defs = vec![format!(
        "{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
        quoted(TableDef::PK)
    )];
    for c in table.columns {
        let mut def = format!("{} {}", quoted(c.name), c.ddl_type);
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(target) = c.references {
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE SET NULL",
                qualified_table(schema, target),
                quoted(TableDef::PK)
            ));
        }
        col_defs.push(def);
    }
    for name in ["created_at", "updated_at"] {
        col_defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted(name)));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(schema, table.name),
        col_defs.join(",\n  ")
    )
}

/// Index on a foreign key column, for `children_of` lookups.
pub fn create_fk_index(table: &TableDef, schema: &str, column: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        quoted(&format!("idx_{}_{}", table.name, column)),
        qualified_table(schema, table.name),
        quoted(column)
    )
}
