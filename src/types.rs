//! Identifiers and wire payloads.
//!
//! The backend hands out an opaque [`TaskId`] for every dataset read and
//! later delivers a [`ResultPayload`] for it. Payload decoding is the
//! validation boundary: the column set is derived from the first row as a
//! [`TableSchema`] and every subsequent row is checked against it, so
//! downstream consumers never see ragged records.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Opaque handle naming an in-progress backend computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a raw identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered identifying tuple for a logical data request.
///
/// Used as a cache lookup key after serialization to a canonical string.
/// Two keys with the same parts in the same order are the same request;
/// order matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Builds a key from its identifying parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// The conventional key for a named dataset: `["table", name]`.
    pub fn for_table(name: &str) -> Self {
        Self::new(["table", name])
    }

    /// Canonical string form, stable across processes.
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.0).expect("a list of strings always serializes")
    }

    /// The identifying parts in order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// A single row record: ordered mapping of column name to cell value.
///
/// `IndexMap` preserves the column order the backend emitted.
pub type RowRecord = IndexMap<String, Value>;

/// The declared column set of a payload, in wire order.
///
/// Derived from the first row at the decode boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<String>,
}

impl TableSchema {
    /// Derives the schema from the first row; empty input yields an empty
    /// column set.
    pub fn from_first_row(rows: &[RowRecord]) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self { columns }
    }

    /// Column identifiers in wire order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether a row carries exactly this column set. Key order within the
    /// row is irrelevant; the set must match.
    pub fn matches(&self, row: &RowRecord) -> bool {
        row.len() == self.columns.len() && self.columns.iter().all(|c| row.contains_key(c))
    }
}

/// Wire shape of a task result body.
#[derive(Debug, Deserialize)]
struct WirePayload {
    result: Vec<RowRecord>,
}

/// Decoded result body: a validated sequence of uniform-shape row records.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPayload {
    schema: TableSchema,
    rows: Vec<RowRecord>,
}

impl ResultPayload {
    /// Decodes a JSON text body of the form `{"result": [{...}, ...]}`.
    ///
    /// Fails if the body is not valid JSON, lacks the `result` field, or
    /// contains a row whose column set diverges from the first row's.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let wire: WirePayload = serde_json::from_str(text)?;
        Self::from_rows(wire.result)
    }

    /// Decodes an already-parsed JSON value with the same validation.
    pub fn from_value(value: Value) -> Result<Self> {
        let wire: WirePayload = serde_json::from_value(value)?;
        Self::from_rows(wire.result)
    }

    /// Validates uniform shape and derives the schema.
    pub fn from_rows(rows: Vec<RowRecord>) -> Result<Self> {
        let schema = TableSchema::from_first_row(&rows);
        for (index, row) in rows.iter().enumerate().skip(1) {
            if !schema.matches(row) {
                return Err(Error::SchemaMismatch {
                    index,
                    expected: schema.columns().to_vec(),
                });
            }
        }
        Ok(Self { schema, rows })
    }

    /// The declared column set.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The row records in delivery order.
    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    /// Whether the payload carries no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
