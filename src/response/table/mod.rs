
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

/// One JSON-safe row: column name to scalar value, in column order
pub type Record = Map<String, Value>;

/// Name of the column a date index is materialized into
pub const DATE_INDEX_COLUMN: &str = "date";

/// A single scalar value of an upstream table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// JSON form of the cell. Dates and timestamps collapse to `YYYY-MM-DD`,
    /// non-finite floats become null.
    #[inline]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Timestamp(ts) => Value::String(ts.date().format("%Y-%m-%d").to_string()),
        }
    }

    /// Text cell, or null for a missing value
    #[inline]
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Self::Null, |s| Self::Text(s.to_string()))
    }

    #[inline]
    pub fn date(value: Option<NaiveDate>) -> Self {
        value.map_or(Self::Null, Self::Date)
    }

    #[inline]
    pub fn integer(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Integer)
    }
}

/// Types that can be laid out as a row of a [`Table`]
pub trait Tabular {
    /// Column names, in display order
    const COLUMNS: &'static [&'static str];

    /// Cells in the same order as [`Tabular::COLUMNS`]
    fn cells(&self) -> Vec<Cell>;
}

/// An ordered sequence of rows sharing one set of columns.
///
/// A table may carry a date index instead of (or in addition to) its named
/// columns; the index is materialized as a leading `date` column on conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    index: Option<Vec<NaiveDate>>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    #[inline]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            index: None,
            rows: Vec::new(),
        }
    }

    /// Table whose rows are ordered along a date axis
    #[inline]
    pub fn with_date_index(columns: Vec<String>, index: Vec<NaiveDate>, rows: Vec<Vec<Cell>>) -> Self {
        let len = index.len().min(rows.len());
        let mut index = index;
        let mut rows = rows;
        index.truncate(len);
        rows.truncate(len);
        Self {
            columns,
            index: Some(index),
            rows,
        }
    }

    #[inline]
    pub fn from_rows<T: Tabular>(items: &[T]) -> Self {
        let columns = T::COLUMNS.iter().map(|c| (*c).to_string()).collect();
        let mut table = Self::new(columns);
        for item in items {
            table.push_row(item.cells());
        }
        table
    }

    /// Append a row. Short rows are padded with nulls, extra cells are dropped.
    #[inline]
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Null);
        self.rows.push(cells);
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert every row to a JSON-safe record
    #[inline]
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut record = Record::new();
                if let Some(date) = self.index.as_ref().and_then(|index| index.get(i)) {
                    record.insert(DATE_INDEX_COLUMN.to_string(), Cell::Date(*date).to_json());
                }
                for (column, cell) in self.columns.iter().zip(row) {
                    record.insert(column.clone(), cell.to_json());
                }
                record
            })
            .collect()
    }
}

/// Convert an optional table to records; an absent table yields no records
#[inline]
pub fn to_records(table: Option<&Table>) -> Vec<Record> {
    table.map(Table::to_records).unwrap_or_default()
}
