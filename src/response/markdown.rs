//! Markdown rendering of records for the human-readable half of a response

use serde_json::Value;

use super::table::Record;

/// Render a listing preview: a `Found` header followed by the table, or a
/// fixed `No {noun} found.` sentence when the result has no rows at all.
#[inline]
pub fn render_listing(rows: &[Record], total: usize, noun: &str) -> String {
    if total == 0 {
        return format!("No {noun} found.");
    }

    let header = format!("**Found {total} {noun} (showing {}):**", rows.len());
    if rows.is_empty() {
        return header;
    }

    format!("{header}\n\n{}", render_table(rows))
}

/// Render records as a pipe table. Columns are taken in first-seen order.
#[inline]
pub fn render_table(rows: &[Record]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(table_line(columns.iter().map(|c| escape(c))));
    lines.push(table_line(columns.iter().map(|_| "---".to_string())));
    for row in rows {
        lines.push(table_line(
            columns
                .iter()
                .map(|c| row.get(*c).map(cell_text).unwrap_or_default()),
        ));
    }
    lines.join("\n")
}

/// Render a single entity as a two-column field/value table
#[inline]
pub fn render_record(record: &Record) -> String {
    let mut lines = Vec::with_capacity(record.len() + 2);
    lines.push("| field | value |".to_string());
    lines.push("| --- | --- |".to_string());
    for (field, value) in record {
        lines.push(table_line([escape(field), cell_text(value)].into_iter()));
    }
    lines.join("\n")
}

/// `## {title} ({units})` heading for a single-entity view, falling back to
/// the entity identifier when the record has no title
#[inline]
pub fn entity_heading(record: &Record, title_key: &str, units_key: &str, fallback: &str) -> String {
    let non_empty = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    match (non_empty(title_key), non_empty(units_key)) {
        (Some(title), Some(units)) => format!("## {title} ({units})"),
        (Some(title), None) => format!("## {title}"),
        (None, _) => format!("## {fallback}"),
    }
}

fn table_line<I>(cells: I) -> String
where
    I: Iterator<Item = String>,
{
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}
