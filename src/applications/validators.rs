// src/applications/validators.rs

use super::models::{CreateApplicationRequest, MAX_MESSAGE_CHARS};
use crate::common::validation::{ValidationResult, Validator};

impl Validator<CreateApplicationRequest> for CreateApplicationRequest {
    fn validate(&self, request: &CreateApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check_length("receiver_id", &request.receiver_id, 1, 64);
        result.check_length("message", &request.message, 1, MAX_MESSAGE_CHARS);
        result
    }
}
