use serde_json::Value;

/// Serialise the whole envelope as a pretty JSON or YAML document.
pub fn render(value: &Value, yaml: bool) -> Result<String, Box<dyn std::error::Error>> {
    if yaml {
        Ok(serde_yaml::to_string(value)?)
    } else {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

pub fn print_json(value: &Value) {
    print_document(value, false);
}

pub fn print_yaml(value: &Value) {
    print_document(value, true);
}

fn print_document(value: &Value, yaml: bool) {
    match render(value, yaml) {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => eprintln!("Serialization error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yaml_render_round_trips_through_input_parser() {
        let envelope = json!({"result": {"cash_on_cash": "0.12", "irr": null}, "warnings": []});
        let text = render(&envelope, true).unwrap();
        let back: Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_json_render_is_pretty() {
        let text = render(&json!({"npv": "1"}), false).unwrap();
        assert_eq!(text, "{\n  \"npv\": \"1\"\n}");
    }
}
