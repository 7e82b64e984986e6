//! Static table definitions. Every table has a BIGINT identity `id`; `columns` lists the rest.

#[derive(Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Type used in CREATE TABLE.
    pub ddl_type: &'static str,
    /// Type used for parameter casts (`$1::text`).
    pub cast_type: &'static str,
    pub nullable: bool,
    /// Referenced table for foreign keys (always its `id`).
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn varchar(name: &'static str) -> Self {
        ColumnDef {
            name,
            ddl_type: "VARCHAR(255)",
            cast_type: "varchar",
            nullable: false,
            references: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        ColumnDef {
            name,
            ddl_type: "TEXT",
            cast_type: "text",
            nullable: false,
            references: None,
        }
    }

    pub const fn foreign_key(name: &'static str, table: &'static str) -> Self {
        ColumnDef {
            name,
            ddl_type: "BIGINT",
            cast_type: "bigint",
            nullable: true,
            references: Some(table),
        }
    }
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub const PK: &'static str = "id";

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True for `id` and every declared column.
    pub fn has_column(&self, name: &str) -> bool {
        name == Self::PK || self.column(name).is_some()
    }
}
