//! Generic tabular rendering.
//!
//! Leaf module: depends on neither the fetcher nor the listener. A
//! [`TableView`] is the display model of a row-record sequence — column
//! identifiers derived from the first record, one body row per record, every
//! cell coerced to a display string. The `Display` impl formats the view as
//! a padded text grid.

use std::fmt;

use serde_json::Value;

use crate::types::{ResultPayload, RowRecord};

/// Header/body grid derived from a sequence of row records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableView {
    /// Builds a view from raw records, deriving columns from the first
    /// record's keys.
    ///
    /// An empty sequence yields an empty view. Records beyond the first are
    /// read through the derived columns: a missing key renders as an empty
    /// cell and extra keys are ignored, so ragged input degrades instead of
    /// panicking. Validated input never exercises either path.
    pub fn from_rows(rows: &[RowRecord]) -> Self {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self::project(&columns, rows)
    }

    /// Builds a view from a decoded payload, using its validated schema so
    /// column order matches the wire order.
    pub fn from_payload(payload: &ResultPayload) -> Self {
        Self::project(payload.schema().columns(), payload.rows())
    }

    fn project(columns: &[String], rows: &[RowRecord]) -> Self {
        let body = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).map(display_cell).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            columns: columns.to_vec(),
            rows: body,
        }
    }

    /// Header cells, one per column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Body rows; each row holds one cell per column.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Whether the view has no columns and no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

/// Coerces a JSON cell value to its display form.
///
/// Strings render verbatim, `null` renders empty, everything else renders
/// as compact JSON.
fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return Ok(());
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{cell:<width$}", width = widths[i])?;
            }
            writeln!(f)
        };

        write_row(f, &self.columns)?;
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{}", "-".repeat(*width))?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write_row(f, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(cells: &[(&str, Value)]) -> RowRecord {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // ---- shape ----

    #[test]
    fn one_header_and_one_cell_per_column_per_record() {
        let rows = vec![
            record(&[("a", json!(1)), ("b", json!(2))]),
            record(&[("a", json!(3)), ("b", json!(4))]),
        ];
        let view = TableView::from_rows(&rows);
        assert_eq!(view.columns(), ["a", "b"]);
        assert_eq!(view.rows().len(), 2);
        assert!(view.rows().iter().all(|row| row.len() == 2));
    }

    #[test]
    fn empty_input_yields_empty_view() {
        let view = TableView::from_rows(&[]);
        assert!(view.is_empty());
        assert_eq!(view.to_string(), "");
    }

    #[test]
    fn columns_come_from_first_record_only() {
        let rows = vec![
            record(&[("a", json!(1))]),
            record(&[("a", json!(2)), ("extra", json!(3))]),
        ];
        let view = TableView::from_rows(&rows);
        assert_eq!(view.columns(), ["a"]);
        assert_eq!(view.rows()[1], ["2"]);
    }

    #[test]
    fn missing_key_renders_empty_cell() {
        let rows = vec![
            record(&[("a", json!(1)), ("b", json!(2))]),
            record(&[("a", json!(3))]),
        ];
        let view = TableView::from_rows(&rows);
        assert_eq!(view.rows()[1], ["3", ""]);
    }

    #[test]
    fn from_payload_uses_wire_column_order() {
        let payload =
            ResultPayload::from_json_str(r#"{"result":[{"b":1,"a":2}]}"#).unwrap();
        let view = TableView::from_payload(&payload);
        assert_eq!(view.columns(), ["b", "a"]);
        assert_eq!(view.rows()[0], ["1", "2"]);
    }

    // ---- cell coercion ----

    #[test]
    fn cells_coerce_to_display_strings() {
        let rows = vec![record(&[
            ("s", json!("text")),
            ("n", json!(2.5)),
            ("t", json!(true)),
            ("z", Value::Null),
            ("o", json!({"k": 1})),
        ])];
        let view = TableView::from_rows(&rows);
        assert_eq!(view.rows()[0], ["text", "2.5", "true", "", r#"{"k":1}"#]);
    }

    // ---- text grid ----

    #[test]
    fn display_pads_columns_and_rules_header() {
        let rows = vec![
            record(&[("name", json!("home")), ("path", json!("/"))]),
            record(&[("name", json!("x")), ("path", json!("/long/path"))]),
        ];
        let view = TableView::from_rows(&rows);
        let text = view.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name  path      ");
        assert_eq!(lines[1], "----  ----------");
        assert_eq!(lines[2], "home  /         ");
        assert_eq!(lines[3], "x     /long/path");
    }

    #[test]
    fn single_row_renders_header_rule_and_body() {
        let rows = vec![record(&[("a", json!(1)), ("b", json!(2))])];
        let view = TableView::from_rows(&rows);
        let lines: Vec<String> = view.to_string().lines().map(String::from).collect();
        assert_eq!(lines, ["a  b", "-  -", "1  2"]);
    }
}
