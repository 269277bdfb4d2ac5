use plexinvest_core::PlexError;
use serde_json::Value;
use std::io::{self, Read};

/// JSON piped on stdin. `None` when stdin is a terminal or carries only
/// whitespace.
pub fn read_stdin() -> Result<Option<Value>, PlexError> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| PlexError::InvalidInput {
            field: "stdin".into(),
            reason: e.to_string(),
        })?;
    parse_piped(&buffer)
}

fn parse_piped(text: &str) -> Result<Option<Value>, PlexError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| PlexError::InvalidInput {
            field: "stdin".into(),
            reason: format!("not a JSON document ({e})"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_pipe_is_no_input() {
        assert!(parse_piped("").unwrap().is_none());
        assert!(parse_piped("  \n\t").unwrap().is_none());
    }

    #[test]
    fn test_piped_document_parses() {
        let value = parse_piped("{\"purchase_price\": \"450000\"}\n").unwrap().unwrap();
        assert_eq!(value["purchase_price"], "450000");
    }

    #[test]
    fn test_malformed_pipe_names_stdin() {
        let err = parse_piped("price=450000").unwrap_err();
        assert!(matches!(err, PlexError::InvalidInput { ref field, .. } if field == "stdin"));
        assert!(err.to_string().contains("not a JSON document"));
    }
}
