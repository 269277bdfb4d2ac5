use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlexError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid rule table: {table} — {reason}")]
    InvalidRuleTable { table: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PlexError {
    fn from(e: serde_json::Error) -> Self {
        PlexError::SerializationError(e.to_string())
    }
}
