//! Typed FRED records and their tabular layout

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::response::{Cell, Table, Tabular};

/// FRED's marker for a missing observation value
const MISSING_VALUE: &str = ".";

/// Length of `YYYY-MM-DD HH:MM:SS`
const TIMESTAMP_LEN: usize = 19;

/// Result of a request keyed by an upstream id
#[derive(Debug, Clone, PartialEq)]
pub enum EntityLookup<T> {
    Single(T),
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    #[serde(default)]
    pub realtime_start: Option<NaiveDate>,
    #[serde(default)]
    pub realtime_end: Option<NaiveDate>,
    pub title: String,
    #[serde(default)]
    pub observation_start: Option<NaiveDate>,
    #[serde(default)]
    pub observation_end: Option<NaiveDate>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub frequency_short: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub units_short: Option<String>,
    #[serde(default)]
    pub seasonal_adjustment: Option<String>,
    #[serde(default)]
    pub seasonal_adjustment_short: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub popularity: Option<i64>,
    #[serde(default)]
    pub group_popularity: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: i64,
    #[serde(default)]
    pub realtime_start: Option<NaiveDate>,
    #[serde(default)]
    pub realtime_end: Option<NaiveDate>,
    pub name: String,
    #[serde(default)]
    pub press_release: Option<bool>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    #[serde(default)]
    pub realtime_start: Option<NaiveDate>,
    #[serde(default)]
    pub realtime_end: Option<NaiveDate>,
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Observation {
    /// Numeric value, `None` for FRED's missing marker or unparsable text
    #[inline]
    pub fn numeric_value(&self) -> Option<f64> {
        let raw = self.value.trim();
        if raw == MISSING_VALUE {
            return None;
        }
        raw.parse().ok()
    }
}

impl Tabular for Series {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "realtime_start",
        "realtime_end",
        "title",
        "observation_start",
        "observation_end",
        "frequency",
        "frequency_short",
        "units",
        "units_short",
        "seasonal_adjustment",
        "seasonal_adjustment_short",
        "last_updated",
        "popularity",
        "group_popularity",
        "notes",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.id.clone()),
            Cell::date(self.realtime_start),
            Cell::date(self.realtime_end),
            Cell::Text(self.title.clone()),
            Cell::date(self.observation_start),
            Cell::date(self.observation_end),
            Cell::text(self.frequency.as_deref()),
            Cell::text(self.frequency_short.as_deref()),
            Cell::text(self.units.as_deref()),
            Cell::text(self.units_short.as_deref()),
            Cell::text(self.seasonal_adjustment.as_deref()),
            Cell::text(self.seasonal_adjustment_short.as_deref()),
            self.last_updated
                .as_deref()
                .map_or(Cell::Null, timestamp_cell),
            Cell::integer(self.popularity),
            Cell::integer(self.group_popularity),
            Cell::text(self.notes.as_deref()),
        ]
    }
}

impl Tabular for Release {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "realtime_start",
        "realtime_end",
        "name",
        "press_release",
        "link",
        "notes",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.id),
            Cell::date(self.realtime_start),
            Cell::date(self.realtime_end),
            Cell::Text(self.name.clone()),
            self.press_release.map_or(Cell::Null, Cell::Bool),
            Cell::text(self.link.as_deref()),
            Cell::text(self.notes.as_deref()),
        ]
    }
}

impl Tabular for Source {
    const COLUMNS: &'static [&'static str] =
        &["id", "realtime_start", "realtime_end", "name", "link", "notes"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.id),
            Cell::date(self.realtime_start),
            Cell::date(self.realtime_end),
            Cell::Text(self.name.clone()),
            Cell::text(self.link.as_deref()),
            Cell::text(self.notes.as_deref()),
        ]
    }
}

/// Observations as a date-indexed table with a single `value` column
#[inline]
pub fn observations_table(observations: &[Observation]) -> Table {
    let index = observations.iter().map(|o| o.date).collect();
    let rows = observations
        .iter()
        .map(|o| vec![o.numeric_value().map_or(Cell::Null, Cell::Float)])
        .collect();
    Table::with_date_index(vec!["value".to_string()], index, rows)
}

/// Parse FRED's `last_updated` stamp (`2024-01-25 07:52:02-06`), keeping the
/// local wall-clock time and dropping the offset. Unrecognized text is kept as-is.
fn timestamp_cell(raw: &str) -> Cell {
    raw.get(..TIMESTAMP_LEN)
        .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").ok())
        .map_or_else(|| Cell::Text(raw.to_string()), Cell::Timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn gdp() -> Series {
        serde_json::from_value(json!({
            "id": "GDP",
            "realtime_start": "2024-02-01",
            "realtime_end": "2024-02-01",
            "title": "Gross Domestic Product",
            "observation_start": "1947-01-01",
            "observation_end": "2023-10-01",
            "frequency": "Quarterly",
            "frequency_short": "Q",
            "units": "Billions of Dollars",
            "units_short": "Bil. of $",
            "seasonal_adjustment": "Seasonally Adjusted Annual Rate",
            "seasonal_adjustment_short": "SAAR",
            "last_updated": "2024-01-25 07:52:02-06",
            "popularity": 93,
            "group_popularity": 93,
            "notes": "BEA Account Code: A191RC"
        }))
        .expect("series should deserialize")
    }

    #[test]
    fn series_record_has_every_column_with_iso_dates() {
        let records = Table::from_rows(&[gdp()]).to_records();
        let record = &records[0];

        assert_eq!(record.len(), Series::COLUMNS.len());
        assert_eq!(record["observation_start"], json!("1947-01-01"));
        assert_eq!(record["last_updated"], json!("2024-01-25"));
        assert_eq!(record["popularity"], json!(93));
    }

    #[test]
    fn series_tolerates_missing_optional_fields() {
        let series: Series = serde_json::from_value(json!({"id": "X", "title": "Minimal"}))
            .expect("minimal series should deserialize");
        let records = Table::from_rows(&[series]).to_records();
        assert_eq!(records[0]["units"], Value::Null);
        assert_eq!(records[0]["group_popularity"], Value::Null);
    }

    #[test]
    fn unparsable_timestamp_is_kept_as_text() {
        assert_eq!(
            timestamp_cell("yesterday"),
            Cell::Text("yesterday".to_string())
        );
        assert!(matches!(
            timestamp_cell("2013-07-31 09:26:16-05"),
            Cell::Timestamp(_)
        ));
    }

    #[test]
    fn missing_observations_become_null() {
        let observations: Vec<Observation> = serde_json::from_value(json!([
            {"date": "2020-01-01", "value": "3.5"},
            {"date": "2020-02-01", "value": "."}
        ]))
        .expect("observations should deserialize");

        let records = observations_table(&observations).to_records();
        assert_eq!(
            Value::Array(records.into_iter().map(Value::Object).collect()),
            json!([
                {"date": "2020-01-01", "value": 3.5},
                {"date": "2020-02-01", "value": null}
            ])
        );
    }
}
