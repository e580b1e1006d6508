//! Tabular layout of a filter result set.
//!
//! No column schema travels with the data, so the header row is taken from the
//! keys of the first record and every row is laid out in that key order.

use serde_json::Value;

use crate::messages::Record;

/// Headers and stringified cells ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn from_records(records: &[Record]) -> Self {
        let Some(first) = records.first() else {
            return Self::default();
        };
        let headers: Vec<String> = first.keys().cloned().collect();
        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|key| record.get(key).map(display_value).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Display width of each column (header or widest cell), in chars.
    pub fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Space-aligned plain text rendering, one line per row after the header.
    pub fn to_plain_text(&self) -> String {
        let widths = self.column_widths();
        let format_line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(format_line(&self.headers));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            out.push(format_line(row));
        }
        out.join("\n")
    }
}

/// String form of a cell value. Strings are shown without quotes; nested
/// values fall back to compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn headers_keep_backend_key_order() {
        let data = records(json!([{ "zeta": 1, "alpha": 2, "mid": 3 }]));
        let table = ResultTable::from_records(&data);
        assert_eq!(table.headers, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn rows_follow_header_order_not_row_order() {
        let data = records(json!([
            { "a": 1, "b": 2 },
            { "b": 4, "a": 3 },
        ]));
        let table = ResultTable::from_records(&data);
        assert_eq!(table.rows[1], vec!["3", "4"]);
    }

    #[test]
    fn missing_cells_render_empty() {
        let data = records(json!([{ "a": 1, "b": 2 }, { "a": 3 }]));
        let table = ResultTable::from_records(&data);
        assert_eq!(table.rows[1], vec!["3", ""]);
    }

    #[test]
    fn display_value_coerces_scalars() {
        assert_eq!(display_value(&json!("Urban")), "Urban");
        assert_eq!(display_value(&json!(4.5)), "4.5");
        assert_eq!(display_value(&json!(null)), "null");
        assert_eq!(display_value(&json!(false)), "false");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn plain_text_pads_columns() {
        let data = records(json!([{ "state": "Bihar", "n": 10 }]));
        let text = ResultTable::from_records(&data).to_plain_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state  n");
        assert_eq!(lines[1], "-----  --");
        assert_eq!(lines[2], "Bihar  10");
    }
}
