use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Dotted keys reach into nested sections of backtest results
    let priority_keys = [
        "cash_on_cash",
        "base_cash_on_cash",
        "irr",
        "npv",
        "base.net_cash_flow",
        "aggregate.total_monthly_cash_flow",
        "base_case.cash_on_cash",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = lookup(result_obj, key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_dotted_path() {
        let result = serde_json::json!({"base": {"net_cash_flow": "-3000"}});
        assert_eq!(lookup(&result, "base.net_cash_flow"), Some(&Value::String("-3000".into())));
        assert_eq!(lookup(&result, "base.missing"), None);
        assert_eq!(lookup(&result, "cash_on_cash"), None);
    }

    #[test]
    fn test_format_minimal_scalars() {
        assert_eq!(format_minimal(&Value::String("0.12".into())), "0.12");
        assert_eq!(format_minimal(&Value::Null), "null");
        assert_eq!(format_minimal(&serde_json::json!(true)), "true");
        assert_eq!(format_minimal(&serde_json::json!([1, 2])), "[1,2]");
    }
}
