use serde_json::Value;
use std::io;

/// Write output as CSV to stdout. Row outputs (`results`) take precedence
/// over the single `result` record.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                write_rows(&mut wtr, rows);
            } else {
                let record = map.get("result").unwrap_or(value);
                write_fields(&mut wtr, record);
            }
        }
        Value::Array(rows) => write_rows(&mut wtr, rows),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    if let Err(e) = wtr.flush() {
        log::error!("failed to flush CSV output: {}", e);
    }
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, record: &Value) {
    let _ = wtr.write_record(["field", "value"]);
    if let Value::Object(fields) = record {
        for (key, val) in fields {
            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
        }
    } else {
        let _ = wtr.write_record(["value", &format_csv_value(record)]);
    }
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            let _ = wtr.write_record([&format_csv_value(row)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&cells);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
