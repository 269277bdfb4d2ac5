pub mod file;
pub mod rules;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Deserialize a command's input from `--input <file>`, else from piped
/// stdin. `None` when neither is present.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}
