//! Positional row marshaling for the remote table.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // cells are checked finite and in range

use serde_json::Value;

use crate::models::{Category, Record, RecordId};

/// Literal header row.
pub const HEADER: [&str; 9] = [
    "id",
    "date",
    "category",
    "amountPrimary",
    "amountSecondary",
    "conversionRate",
    "conversionMarkup",
    "note",
    "createdAt",
];

/// Encode a record as the 9-column row. Absent optionals become blank cells.
pub fn record_to_row(record: &Record) -> Vec<Value> {
    vec![
        Value::from(record.id.as_str()),
        Value::from(record.date.as_str()),
        Value::from(record.category.key()),
        Value::from(record.amount_primary),
        optional_number(record.amount_secondary),
        optional_number(record.conversion_rate),
        optional_number(record.conversion_markup),
        Value::from(record.note.as_str()),
        Value::from(record.created_at),
    ]
}

/// Decode one row. Returns `None` when the id cell is missing or blank.
pub fn row_to_record(row: &[Value]) -> Option<Record> {
    let id = RecordId::parse(&cell_text(row.first()))?;
    let category = cell_text(row.get(2));

    Some(Record {
        id,
        date: cell_text(row.get(1)),
        category: if category.is_empty() {
            Category::Other
        } else {
            Category::from_label_lossy(&category)
        },
        amount_primary: cell_u64(row.get(3)),
        amount_secondary: cell_f64(row.get(4)),
        conversion_rate: cell_f64(row.get(5)),
        conversion_markup: cell_f64(row.get(6)),
        note: cell_text(row.get(7)),
        created_at: cell_i64(row.get(8)),
    })
}

/// Decode a full table, skipping a leading header row.
pub fn rows_to_records(rows: &[Vec<Value>]) -> Vec<Record> {
    let start = usize::from(
        rows.first()
            .is_some_and(|first| cell_text(first.first()) == HEADER[0]),
    );

    let mut discarded = 0usize;
    let records = rows[start..]
        .iter()
        .filter_map(|row| {
            let record = row_to_record(row);
            if record.is_none() {
                discarded += 1;
            }
            record
        })
        .collect();

    if discarded > 0 {
        tracing::debug!("Discarded {} remote rows without an id", discarded);
    }
    records
}

fn optional_number(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::from(""), Value::Number)
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn cell_f64(cell: Option<&Value>) -> Option<f64> {
    let value = match cell? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn cell_u64(cell: Option<&Value>) -> u64 {
    if let Some(Value::Number(number)) = cell {
        if let Some(value) = number.as_u64() {
            return value;
        }
    }
    match cell_f64(cell) {
        Some(value) if value >= 0.0 && value < u64::MAX as f64 => value.round() as u64,
        _ => 0,
    }
}

fn cell_i64(cell: Option<&Value>) -> i64 {
    match cell {
        Some(Value::Number(number)) if number.is_i64() => number.as_i64().unwrap_or(0),
        Some(Value::String(text)) if text.trim().parse::<i64>().is_ok() => {
            text.trim().parse().unwrap_or(0)
        }
        _ => match cell_f64(cell) {
            Some(value) if value.abs() < i64::MAX as f64 => value.round() as i64,
            _ => 0,
        },
    }
}
