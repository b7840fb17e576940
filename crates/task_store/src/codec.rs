//! JSON text codec for list-valued columns.
//!
//! `tags` and `reminder_days` are stored as JSON array text. NULL and empty
//! cells decode to an empty list; anything else must be a well-formed array
//! of strings.

/// Encodes a list of strings as JSON array text.
pub fn encode(values: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes JSON array text into a list of strings.
pub fn decode(text: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    match text.map(str::trim) {
        None | Some("") | Some("null") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text),
    }
}
