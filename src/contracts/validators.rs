// src/contracts/validators.rs

use super::models::{ContractTerms, MAX_MONTHLY_FEE, MAX_SUBJECTS, MIN_MONTHLY_FEE};
use crate::common::validation::{ValidationResult, Validator};

pub struct ContractTermsValidator;

impl Validator<ContractTerms> for ContractTermsValidator {
    fn validate(&self, terms: &ContractTerms) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_range("monthly_fee", terms.monthly_fee, MIN_MONTHLY_FEE, MAX_MONTHLY_FEE);
        result.check_range("days_per_week", terms.days_per_week, 1, 7);

        if terms.subjects.is_empty() || terms.subjects.len() > MAX_SUBJECTS {
            result.add_error(
                "subjects",
                &format!("must list between 1 and {} subjects", MAX_SUBJECTS),
            );
        } else if terms.subjects.iter().any(|s| s.trim().is_empty()) {
            result.add_error("subjects", "subjects cannot be blank");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(fee: i64, days: i64, subjects: &[&str]) -> ContractTerms {
        ContractTerms {
            monthly_fee: fee,
            days_per_week: days,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_terms_bounds() {
        assert!(ContractTermsValidator.validate(&terms(500, 1, &["Math"])).is_valid);
        assert!(ContractTermsValidator.validate(&terms(200_000, 7, &["Math"])).is_valid);

        let result = ContractTermsValidator.validate(&terms(499, 8, &[]));
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["monthly_fee", "days_per_week", "subjects"]);

        assert!(!ContractTermsValidator.validate(&terms(6000, 3, &["Math", " "])).is_valid);
        let eleven: Vec<&str> = vec!["S"; 11];
        assert!(!ContractTermsValidator.validate(&terms(6000, 3, &eleven)).is_valid);
    }
}
