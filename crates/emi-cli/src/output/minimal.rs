use serde_json::Value;

/// Fields printed by `--output minimal`, most specific first.
const PRIORITY_KEYS: [&str; 4] = ["emi", "down_payment", "implied_emi", "months"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        // A down payment solve answers with the down payment, not the EMI
        if map.contains_key("target_emi") {
            if let Some(dp) = map.get("down_payment") {
                println!("{}", format_minimal(dp));
                return;
            }
        }

        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }
    }

    // Tenure listing and other array outputs: one value per line
    if let Some(Value::Array(rows)) = value.get("results") {
        for row in rows {
            let cell = row.get("months").unwrap_or(row);
            println!("{}", format_minimal(cell));
        }
        return;
    }

    println!("{}", format_minimal(result_obj));
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
