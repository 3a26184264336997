//! SQLite-backed columnar source.
//!
//! RULE: Only source.rs talks to the database.
//! Everything downstream works on a materialized [`Table`]; the
//! deriver and reducers never execute SQL.
//!
//! The household table may hold tens of millions of rows, so the
//! loader materializes exactly the requested columns and nothing
//! else. Requested names are validated against the schema before any
//! row is read.

use crate::{
    error::{AggError, AggResult},
    fields,
    table::{Cell, Column, ColumnKind, FieldInfo, Table},
};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashMap;

const TABLE_NAME: &str = "household";

pub struct HouseholdSource {
    conn: Connection,
}

impl HouseholdSource {
    /// Open (or create) the household database at `path`.
    pub fn open(path: &str) -> AggResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and sample runs).
    pub fn in_memory() -> AggResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    // ── Schema ─────────────────────────────────────────────────────

    /// Read the schema (field name + primitive kind) without touching
    /// row data.
    pub fn schema(&self) -> AggResult<Vec<FieldInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{TABLE_NAME}\")"))?;
        let infos = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let decl: String = row.get(2)?;
                Ok((name, decl))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(infos
            .into_iter()
            .map(|(name, decl)| {
                let kind = if decl.to_ascii_uppercase().contains("INT") {
                    ColumnKind::Int
                } else {
                    ColumnKind::Float
                };
                FieldInfo { name, kind }
            })
            .collect())
    }

    pub fn field_names(&self) -> AggResult<Vec<String>> {
        Ok(self.schema()?.into_iter().map(|f| f.name).collect())
    }

    /// Schema fields whose name starts with `prefix` (at a dot
    /// boundary) and ends with the `fuel` suffix. Used to request
    /// e.g. every `consumption.*.electricity` column by pattern.
    pub fn fields_matching(&self, prefix: &str, fuel: &str) -> AggResult<Vec<String>> {
        Ok(self
            .field_names()?
            .into_iter()
            .filter(|n| fields::has_prefix(n, prefix) && fields::fuel_of(n) == Some(fuel))
            .collect())
    }

    /// All schema fields with the given quantity prefix.
    pub fn fields_with_prefix(&self, prefix: &str) -> AggResult<Vec<String>> {
        Ok(self
            .field_names()?
            .into_iter()
            .filter(|n| fields::has_prefix(n, prefix))
            .collect())
    }

    // ── Loading ────────────────────────────────────────────────────

    /// Materialize exactly the requested columns, in request order.
    ///
    /// Every name is checked against the schema first; a missing
    /// field fails with `SchemaMismatch` before any row is read.
    pub fn load(&self, requested: &[&str]) -> AggResult<Table> {
        let schema = self.schema()?;
        let kinds: HashMap<&str, ColumnKind> =
            schema.iter().map(|f| (f.name.as_str(), f.kind)).collect();

        for name in requested {
            if !kinds.contains_key(name) {
                return Err(AggError::SchemaMismatch { field: name.to_string() });
            }
        }

        let select_list = requested
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {select_list} FROM \"{TABLE_NAME}\""))?;

        let mut columns: Vec<Column> = requested
            .iter()
            .map(|n| match kinds[*n] {
                ColumnKind::Int => Column::Int(Vec::new()),
                ColumnKind::Float => Column::Float(Vec::new()),
            })
            .collect();

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, col) in columns.iter_mut().enumerate() {
                match col {
                    Column::Int(v) => v.push(row.get::<_, i64>(i)?),
                    Column::Float(v) => v.push(row.get::<_, f64>(i)?),
                }
            }
        }

        let mut table = Table::new();
        for (name, col) in requested.iter().zip(columns) {
            table.insert(name, col);
        }
        log::debug!(
            "loaded {} columns x {} rows from {TABLE_NAME}",
            table.num_columns(),
            table.num_rows()
        );
        Ok(table)
    }

    // ── Write path ─────────────────────────────────────────────────
    //
    // Used only by the sample-data generator and tests. The
    // aggregation pipeline itself never writes.

    /// (Re)create the household table with the given schema.
    pub fn create_table(&self, schema: &[FieldInfo]) -> AggResult<()> {
        let column_list = schema
            .iter()
            .map(|f| {
                let decl = match f.kind {
                    ColumnKind::Int => "INTEGER NOT NULL",
                    ColumnKind::Float => "REAL NOT NULL",
                };
                format!("\"{}\" {decl}", f.name)
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS \"{TABLE_NAME}\";"))?;
        self.conn
            .execute_batch(&format!("CREATE TABLE \"{TABLE_NAME}\" ({column_list});"))?;
        Ok(())
    }

    /// Append rows in one transaction. Each row's cells must line up
    /// with `schema` (same order, same kinds).
    pub fn append_rows(&self, schema: &[FieldInfo], rows: &[Vec<Cell>]) -> AggResult<()> {
        let column_list = schema
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=schema.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        self.conn.execute_batch("BEGIN")?;
        let result = (|| -> AggResult<()> {
            let mut stmt = self.conn.prepare(&format!(
                "INSERT INTO \"{TABLE_NAME}\" ({column_list}) VALUES ({placeholders})"
            ))?;
            for row in rows {
                stmt.execute(params_from_iter(row.iter().map(|c| match c {
                    Cell::Int(v) => rusqlite::types::Value::Integer(*v),
                    Cell::Float(v) => rusqlite::types::Value::Real(*v),
                })))?;
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}
