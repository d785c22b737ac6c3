pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load the primary document from `--input`, falling back to piped stdin
/// (JSON or YAML).
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_document(path)
    } else if let Some(document) = stdin::read_stdin()? {
        Ok(document)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {}", what).into())
    }
}

/// Load an optional secondary document; `T::default()` when no path is given.
pub fn read_optional<T: DeserializeOwned + Default>(
    path: Option<&str>,
) -> Result<T, Box<dyn std::error::Error>> {
    match path {
        Some(path) => file::read_document(path),
        None => Ok(T::default()),
    }
}
