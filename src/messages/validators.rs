use crate::common::error::ApiError;

pub const MAX_MESSAGE_CHARS: usize = 10000;

/// Validate message content
pub fn validate_message_content(content: &str) -> Result<(), ApiError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(ApiError::ValidationError(
            "Message cannot be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::ValidationError(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    Ok(())
}
