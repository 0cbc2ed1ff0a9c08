use serde_json::{Map, Number, Value};

use minerva_core::Table;

/// Convert a table into one JSON object per row.
///
/// Cell values are typed by inference, in order: `i64`, `f64`, boolean
/// literals, falling back to strings. NULL cells become JSON `null`.
pub fn to_json_records(table: &Table) -> Vec<Value> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::with_capacity(table.columns.len());
            for (i, col) in table.columns.iter().enumerate() {
                let value = match row.get(i) {
                    Some(Some(cell)) => infer_value(cell),
                    _ => Value::Null,
                };
                object.insert(col.clone(), value);
            }
            Value::Object(object)
        })
        .collect()
}

/// Parse a cell into the narrowest JSON value that fits.
fn infer_value(cell: &str) -> Value {
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        // NaN and infinities have no JSON representation; keep those as text.
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}
