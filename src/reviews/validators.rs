// src/reviews/validators.rs

use super::models::CreateReviewRequest;
use crate::common::{ValidationResult, Validator};

pub struct ReviewValidator;

impl Validator<CreateReviewRequest> for ReviewValidator {
    fn validate(&self, data: &CreateReviewRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.reviewee_id.trim().is_empty() {
            result.add_error("reviewee_id", "Reviewee is required");
        }
        result.check_range("rating", data.rating, 1, 5);
        if let Some(comment) = &data.comment {
            result.check_length("comment", comment, 0, 1000);
        }

        result
    }
}
