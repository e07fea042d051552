use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render output as tables using the tabled crate.
///
/// Scalars become a Field/Value table; nested `metrics` objects are flattened
/// into it and arrays of objects (fund lists, investment breakdowns) get a
/// table of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_section(result);
                print_envelope_notes(map);
            }
            None => print_section(value),
        },
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", value),
    }
}

fn print_section(value: &Value) {
    match value {
        Value::Object(map) => {
            print_fields(map);
            for (key, val) in map {
                if let Value::Array(rows) = val {
                    println!("\n{}:", key);
                    print_rows(rows);
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", format_value(value)),
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        match val {
            Value::Array(_) => {}
            Value::Object(inner) if key == "metrics" => {
                for (k, v) in inner {
                    builder.push_record([k.as_str(), &format_value(v)]);
                }
            }
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            println!("{}", format_value(row));
        }
        return;
    };

    // Nested metrics are lifted into columns; other arrays are dropped.
    let headers: Vec<String> = first
        .iter()
        .flat_map(|(k, v)| match v {
            Value::Object(inner) if k == "metrics" => inner.keys().cloned().collect::<Vec<_>>(),
            Value::Array(_) => Vec::new(),
            _ => vec![k.clone()],
        })
        .collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let metrics = map.get("metrics").and_then(Value::as_object);
            let cells: Vec<String> = headers
                .iter()
                .map(|h| {
                    map.get(h.as_str())
                        .or_else(|| metrics.and_then(|m| m.get(h.as_str())))
                        .map(format_value)
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(cells);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
