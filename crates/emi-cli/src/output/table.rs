use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render a command result as tables: the `result` object as field/value
/// rows, then any `results` rows (session steps, tenure options).
pub fn print_table(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", value);
        return;
    };

    if let Some(result) = map.get("result") {
        print_field_table(result);
    }
    if let Some(Value::Array(rows)) = map.get("results") {
        if map.contains_key("result") {
            println!();
        }
        print_rows_table(rows);
    }
    if !map.contains_key("result") && !map.contains_key("results") {
        print_field_table(value);
    }

    print_notes(map);
}

fn print_field_table(value: &Value) {
    let Value::Object(fields) = value else {
        println!("{}", format_value(value));
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        match val {
            // Flatten the formatted display block into its own rows
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    builder.push_record([format!("{key}.{inner_key}"), format_value(inner_val)]);
                }
            }
            _ => builder.push_record([key.clone(), format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));
}

fn print_rows_table(rows: &[Value]) {
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

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(cells);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
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
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
