use std::fmt::{Display, Formatter};

use serde::Serialize;
use serde_json::Value;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) if value.is_nan() => f.write_str("NaN"),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(flag) => Self::Text(flag.to_string()),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Integer)
                .or_else(|| number.as_f64().map(Self::Number))
                .unwrap_or(Self::Empty),
            Value::String(text) => Self::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

/// Column-named rectangular table. Short rows are padded with empty cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut row: Vec<Cell> = cells.into_iter().take(self.columns.len()).collect();
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn with_row<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        self.push_row(cells);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row per JSON object, nested objects flattened to dotted columns.
    ///
    /// Columns appear in first-seen order; arrays are kept as JSON text.
    pub fn from_json_records(records: &[Value]) -> Self {
        let flattened: Vec<Vec<(String, Value)>> = records
            .iter()
            .map(|record| {
                let mut fields = Vec::new();
                flatten_into(record, None, &mut fields);
                fields
            })
            .collect();

        let mut table = Self::default();
        for (name, _) in flattened.iter().flatten() {
            if !table.columns.contains(name) {
                table.columns.push(name.clone());
            }
        }
        for fields in &flattened {
            let row = table
                .columns
                .iter()
                .map(|column| {
                    fields
                        .iter()
                        .find(|(name, _)| name == column)
                        .map_or(Cell::Empty, |(_, value)| Cell::from(value))
                })
                .collect::<Vec<_>>();
            table.push_row(row);
        }
        table
    }
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let name = prefix.map_or_else(|| key.clone(), |prefix| format!("{prefix}.{key}"));
                flatten_into(nested, Some(&name), out);
            }
        }
        other => out.push((prefix.unwrap_or("value").to_owned(), other.clone())),
    }
}
