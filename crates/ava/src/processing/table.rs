use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Rows and columns from a CSV or spreadsheet upload. The header row is not
/// counted as a data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnType {
    /// Dtype names as a dataframe library would report them.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int64",
            Self::Float => "float64",
            Self::Bool => "bool",
            Self::Text => "object",
        }
    }
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        let widest_row = self.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        self.headers.len().max(widest_row)
    }

    fn header(&self, idx: usize) -> String {
        self.headers
            .get(idx)
            .filter(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Unnamed: {}", idx))
    }

    fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |row| row.get(idx))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn column_type(&self, idx: usize) -> ColumnType {
        let values: Vec<&str> = self.column_values(idx).collect();
        if values.is_empty() {
            return ColumnType::Text;
        }
        if values.iter().all(|v| v.parse::<i64>().is_ok()) {
            ColumnType::Int
        } else if values.iter().all(|v| v.parse::<f64>().is_ok()) {
            ColumnType::Float
        } else if values
            .iter()
            .all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
        {
            ColumnType::Bool
        } else {
            ColumnType::Text
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        (0..self.column_count()).map(|i| self.header(i)).collect()
    }

    pub fn column_types(&self) -> Vec<(String, ColumnType)> {
        (0..self.column_count())
            .map(|i| (self.header(i), self.column_type(i)))
            .collect()
    }

    /// Rows as JSON objects keyed by header, with numeric and boolean columns
    /// emitted as JSON numbers and booleans.
    pub fn to_json_records(&self) -> JsonValue {
        let types = self.column_types();
        let records = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (idx, (name, column_type)) in types.iter().enumerate() {
                    let raw = row.get(idx).map(|v| v.trim()).unwrap_or("");
                    obj.insert(name.clone(), typed_value(raw, *column_type));
                }
                JsonValue::Object(obj)
            })
            .collect();
        JsonValue::Array(records)
    }

    /// Markdown table of the first `max_rows` rows with a leading index column.
    pub fn to_markdown(&self, max_rows: usize) -> String {
        let names = self.column_names();
        let mut out = String::new();

        out.push_str("|    |");
        for name in &names {
            out.push_str(&format!(" {} |", escape_cell(name)));
        }
        out.push('\n');

        out.push_str("|---:|");
        for _ in &names {
            out.push_str(":---|");
        }
        out.push('\n');

        for (idx, row) in self.rows.iter().take(max_rows).enumerate() {
            out.push_str(&format!("| {} |", idx));
            for col in 0..names.len() {
                let cell = row.get(col).map(|c| c.as_str()).unwrap_or("");
                out.push_str(&format!(" {} |", escape_cell(cell)));
            }
            out.push('\n');
        }

        out
    }

    /// Comma-separated rendering used when the table becomes question context.
    /// Cells holding delimiters, quotes or newlines are quoted.
    pub fn to_csv_text(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(self.column_names())?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| anyhow!("failed to flush CSV: {}", e))?;
        let text = String::from_utf8(bytes)?;
        Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
    }
}

fn typed_value(raw: &str, column_type: ColumnType) -> JsonValue {
    if raw.is_empty() {
        return JsonValue::Null;
    }
    match column_type {
        ColumnType::Int => raw
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| JsonValue::from(raw)),
        ColumnType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::from(raw)),
        ColumnType::Bool => JsonValue::Bool(raw.eq_ignore_ascii_case("true")),
        ColumnType::Text => JsonValue::from(raw),
    }
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}
