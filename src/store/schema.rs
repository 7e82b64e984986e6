//! Database bootstrap: create the database when missing, then the entity tables.

use crate::domain::{ChildOf, EntityFields, Facility, Resident, Room};
use crate::error::{AppError, ConfigError};
use crate::sql;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Creates the entity tables and foreign key indexes if they do not exist. Parents before children.
pub async fn ensure_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    let mut statements = vec![sql::create_schema(schema)];
    statements.push(sql::create_table(Resident::table(), schema));
    statements.push(sql::create_table(Room::table(), schema));
    statements.push(sql::create_fk_index(Room::table(), schema, Room::parent_column()));
    statements.push(sql::create_table(Facility::table(), schema));
    statements.push(sql::create_fk_index(Facility::table(), schema, Facility::parent_column()));

    for ddl in &statements {
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(schema = %schema, tables = 3, "tables ready");
    Ok(())
}

/// Connects to the `postgres` maintenance database and creates the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url).map_err(|e| invalid_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn invalid_url(message: String) -> ConfigError {
    ConfigError::Invalid {
        key: "DATABASE_URL",
        message,
    }
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url.rfind('/').ok_or_else(|| invalid_url("no database path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let query = path_and_query.find('?').map(|i| &path_and_query[i..]).unwrap_or("");
    Ok((format!("{}postgres{}", base, query), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
