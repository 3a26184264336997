//! Column-major in-memory table.
//!
//! The loader materializes exactly the requested columns here; the
//! deriver appends new columns; the reducers only read. Columns keep
//! the primitive kind the source schema declared (INTEGER or REAL).

use crate::error::{AggError, AggResult};
use std::collections::HashMap;

/// Primitive column kind, as declared by the source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
}

/// A schema entry: field name plus primitive kind.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub kind: ColumnKind,
}

impl FieldInfo {
    pub fn int(name: &str) -> Self {
        Self { name: name.to_string(), kind: ColumnKind::Int }
    }

    pub fn float(name: &str) -> Self {
        Self { name: name.to_string(), kind: ColumnKind::Float }
    }
}

/// One fully materialized column.
#[derive(Debug, Clone)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Int(_) => ColumnKind::Int,
            Column::Float(_) => ColumnKind::Float,
        }
    }
}

/// A single cell, used only on the write path (sample generation).
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Int(i64),
    Float(f64),
}

#[derive(Debug)]
pub struct Table {
    order: Vec<String>,
    columns: HashMap<String, Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self { order: Vec::new(), columns: HashMap::new(), rows: 0 }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.order.len()
    }

    /// Field names in insertion order (the order they were requested).
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Append a column. The first column fixes the row count; every
    /// later column must match it.
    pub fn insert(&mut self, name: &str, column: Column) {
        if self.order.is_empty() {
            self.rows = column.len();
        }
        assert_eq!(
            column.len(),
            self.rows,
            "column '{name}' has {} rows, table has {}",
            column.len(),
            self.rows
        );
        if !self.columns.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.columns.insert(name.to_string(), column);
    }

    /// Remove and return a column (used by the fold-then-drop step).
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let col = self.columns.remove(name)?;
        self.order.retain(|n| n != name);
        Some(col)
    }

    pub fn column(&self, name: &str) -> AggResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| AggError::SchemaMismatch { field: name.to_string() })
    }

    /// Borrow a REAL column's values.
    pub fn float(&self, name: &str) -> AggResult<&[f64]> {
        match self.column(name)? {
            Column::Float(v) => Ok(v),
            Column::Int(_) => Err(AggError::WrongKind { field: name.to_string(), wanted: "REAL" }),
        }
    }

    /// Mutably borrow a REAL column's values.
    pub fn float_mut(&mut self, name: &str) -> AggResult<&mut Vec<f64>> {
        match self.columns.get_mut(name) {
            Some(Column::Float(v)) => Ok(v),
            Some(Column::Int(_)) => {
                Err(AggError::WrongKind { field: name.to_string(), wanted: "REAL" })
            }
            None => Err(AggError::SchemaMismatch { field: name.to_string() }),
        }
    }

    /// Borrow an INTEGER column's values.
    pub fn int(&self, name: &str) -> AggResult<&[i64]> {
        match self.column(name)? {
            Column::Int(v) => Ok(v),
            Column::Float(_) => {
                Err(AggError::WrongKind { field: name.to_string(), wanted: "INTEGER" })
            }
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
