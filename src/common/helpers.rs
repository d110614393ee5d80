// Helper functions for safe logging and JSON column handling

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```ignore
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 && !parts[0].is_empty() {
            let first = parts[0].chars().next().unwrap_or('*');
            format!("{}***@{}", first, parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Parses a JSON text column into its typed form.
///
/// Rows written by older clients sometimes hold malformed JSON; those
/// degrade to the type's default instead of failing the whole request.
pub fn parse_json_column<T>(raw: Option<&str>, column: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match raw {
        Some(text) if !text.trim().is_empty() => match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(column = %column, error = %e, "Malformed JSON column, using default");
                T::default()
            }
        },
        _ => T::default(),
    }
}

/// Serializes a value for a JSON text column.
pub fn to_json_column<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Current UTC time as an RFC 3339 string, the format every timestamp column uses.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
