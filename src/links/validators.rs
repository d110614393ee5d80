// src/links/validators.rs

use super::models::{
    CreateLinkRequest, PostLinkMessageRequest, MAX_ANONYMOUS_MESSAGE_CHARS, MAX_TITLE_CHARS,
};
use crate::common::validation::{ValidationResult, Validator};

impl Validator<CreateLinkRequest> for CreateLinkRequest {
    fn validate(&self, request: &CreateLinkRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if let Some(title) = &request.title {
            result.check_length("title", title, 0, MAX_TITLE_CHARS);
        }
        result
    }
}

impl Validator<PostLinkMessageRequest> for PostLinkMessageRequest {
    fn validate(&self, request: &PostLinkMessageRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check_length("content", &request.content, 1, MAX_ANONYMOUS_MESSAGE_CHARS);
        if let Some(fingerprint) = &request.fingerprint {
            result.check_length("fingerprint", fingerprint, 0, 128);
        }
        result
    }
}
