use serde_json::Value;

/// Headline figures, most important first.
const PRIORITY_KEYS: [&str; 6] = [
    "tvpi",
    "current_value",
    "latest_valuation",
    "dpi",
    "rvpi",
    "paid_in",
];

/// Print just the headline number.
///
/// Fund reports nest their ratios under `metrics`, so that object is searched
/// before falling back to the first scalar field.
pub fn print_minimal(value: &Value) {
    if let Value::Array(rows) = value {
        for row in rows {
            println!("{}", headline(row));
        }
        return;
    }
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let Value::Object(map) = value else {
        return format_minimal(value);
    };

    let nested = map.get("metrics").and_then(Value::as_object);
    for key in PRIORITY_KEYS {
        let found = nested
            .and_then(|m| m.get(key))
            .or_else(|| map.get(key));
        if let Some(val) = found {
            return match map.get("fund_id") {
                Some(id) => format!("{}: {}", format_minimal(id), format_minimal(val)),
                None => format_minimal(val),
            };
        }
    }

    map.iter()
        .find(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, v)| format!("{}: {}", k, format_minimal(v)))
        .unwrap_or_default()
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
