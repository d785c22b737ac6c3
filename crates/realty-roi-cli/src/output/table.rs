use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render the envelope as tables: the headline fields of the result first,
/// then one titled table per nested section (backtest `base`, `performance`,
/// projection `years`, scenario rows, ...), then warnings and methodology.
pub fn print_table(value: &Value) {
    let Some(envelope) = value.as_object() else {
        println!("{}", cell(value));
        return;
    };

    match envelope.get("result") {
        Some(Value::Object(result)) => print_sections(result),
        Some(other) => println!("{}", cell(other)),
        None => print_sections(envelope),
    }

    let warnings = super::envelope_warnings(value);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in warnings {
            println!("  - {}", w);
        }
    }

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

/// Where a result field is rendered.
enum Section<'a> {
    Scalar(&'a Value),
    Nested(&'a Map<String, Value>),
    Rows(&'a [Value]),
}

fn classify(value: &Value) -> Section<'_> {
    match value {
        Value::Object(map) if !map.is_empty() => Section::Nested(map),
        Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
            Section::Rows(rows)
        }
        other => Section::Scalar(other),
    }
}

fn print_sections(result: &Map<String, Value>) {
    let mut headline = Builder::default();
    headline.push_record(["Field", "Value"]);
    let mut deferred = Vec::new();

    for (key, val) in result {
        match classify(val) {
            Section::Scalar(v) => {
                headline.push_record([key.as_str(), &cell(v)]);
            }
            section => deferred.push((key.as_str(), section)),
        }
    }
    println!("{}", Table::from(headline));

    for (key, section) in deferred {
        println!("\n{}:", key);
        match section {
            Section::Nested(map) => println!("{}", field_table(map)),
            Section::Rows(rows) => println!("{}", row_table(rows)),
            Section::Scalar(_) => {}
        }
    }
}

fn field_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &cell(val)]);
    }
    Table::from(builder)
}

/// Columns come from the union of keys, in first-seen order.
fn row_table(rows: &[Value]) -> Table {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows.iter().filter_map(Value::as_object) {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().copied());
    for row in rows.iter().filter_map(Value::as_object) {
        builder.push_record(
            columns
                .iter()
                .map(|c| row.get(*c).map(cell).unwrap_or_default()),
        );
    }
    Table::from(builder)
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        other => other.to_string(),
    }
}
