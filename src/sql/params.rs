//! Typed bind values. The declared parameter type comes from the column, never from the value,
//! so a statement keeps the same parameter types whether a value is null or not.

use crate::domain::ColumnDef;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Int8(Option<i64>),
    Text(Option<String>),
}

impl PgBindValue {
    /// Converts a JSON value for `column`. Values of the wrong JSON kind bind as NULL.
    pub fn for_column(column: &ColumnDef, v: &Value) -> Self {
        match column.cast_type {
            "bigint" => PgBindValue::Int8(v.as_i64()),
            _ => PgBindValue::Text(v.as_str().map(str::to_string)),
        }
    }

    pub fn id(raw: i64) -> Self {
        PgBindValue::Int8(Some(raw))
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Int8(n) => <Option<i64> as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::Text(s) => <Option<String> as Encode<Postgres>>::encode_by_ref(s, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Int8(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::Text(_) => <String as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}
