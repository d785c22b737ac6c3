use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Parse a piped document. JSON is a subset of YAML, so one parser covers
/// both input formats accepted by `--input`.
pub fn parse_document<T: DeserializeOwned>(text: &str) -> Result<T, Box<dyn std::error::Error>> {
    serde_yaml::from_str(text).map_err(|e| format!("Failed to parse stdin: {}", e).into())
}

/// Read a JSON or YAML document from stdin when data is piped.
/// `None` for an interactive terminal or empty input.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    match buffer.trim() {
        "" => Ok(None),
        text => parse_document(text).map(Some),
    }
}
