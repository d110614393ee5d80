// src/profiles/validators.rs

use super::models::*;
use crate::auth::validators::is_valid_username;
use crate::common::geo::Coordinates;
use crate::common::{ValidationResult, Validator};

pub struct ProfileUpdateValidator;

impl Validator<UpdateProfileRequest> for ProfileUpdateValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(username) = &data.username {
            if !is_valid_username(username.trim()) {
                result.add_error(
                    "username",
                    "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
                );
            }
        }

        if let Some(area) = &data.primary_area {
            result.check_length("primary_area", area, 0, 100);
        }
        if let Some(location) = &data.location {
            result.check_length("location", location, 0, 255);
        }

        match (data.latitude, data.longitude) {
            (Some(lat), Some(lng)) => {
                if !Coordinates::new(lat, lng).is_valid() {
                    result.add_error("latitude", "Coordinates are out of range");
                }
            }
            (None, None) => {}
            _ => result.add_error("latitude", "Latitude and longitude must be sent together"),
        }

        result
    }
}

fn check_teaching_details(result: &mut ValidationResult, details: &TeachingDetails) {
    if details.subjects.len() > 20 {
        result.add_error("subjects", "At most 20 subjects");
    }
    if details.subjects.iter().any(|s| s.trim().is_empty() || s.len() > 60) {
        result.add_error("subjects", "Subjects must be 1-60 characters");
    }
    if details.classes.len() > 20 {
        result.add_error("classes", "At most 20 classes");
    }
    if details.preferred_areas.len() > 20 {
        result.add_error("preferred_areas", "At most 20 preferred areas");
    }
    if let Some(min) = details.salary_min {
        if min < 0 {
            result.add_error("salary_min", "Salary cannot be negative");
        }
    }
    if let (Some(min), Some(max)) = (details.salary_min, details.salary_max) {
        if max < min {
            result.add_error("salary_max", "Maximum salary must not be below minimum");
        }
    }
    if let Some(days) = details.days_per_week {
        result.check_range("days_per_week", days, 1, 7);
    }
}

pub struct TutorDetailsValidator;

impl Validator<UpsertTutorRequest> for TutorDetailsValidator {
    fn validate(&self, data: &UpsertTutorRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(details) = &data.teaching_details {
            check_teaching_details(&mut result, details);
        }
        if let Some(bio) = &data.bio {
            result.check_length("bio", bio, 0, 2000);
        }
        if let Some(infos) = &data.varsity_infos {
            if infos.len() > 5 {
                result.add_error("varsity_infos", "At most 5 universities");
            }
            if infos.iter().any(|i| i.university.trim().is_empty()) {
                result.add_error("varsity_infos", "University name is required");
            }
        }

        result
    }
}

pub struct StudentDetailsValidator;

impl Validator<UpsertStudentRequest> for StudentDetailsValidator {
    fn validate(&self, data: &UpsertStudentRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if let Some(details) = &data.teaching_details {
            check_teaching_details(&mut result, details);
        }
        result
    }
}

/// University mail domains: `.edu`, `.edu.xx`, `.ac.xx`.
pub fn is_academic_email(email: &str) -> bool {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.starts_with('.') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    match labels.as_slice() {
        [.., "edu"] => labels.len() >= 2,
        [.., "edu" | "ac", country] => labels.len() >= 3 && country.len() == 2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_email() {
        assert!(is_academic_email("rahim@g.bracu.ac.bd"));
        assert!(is_academic_email("nadia@du.ac.bd"));
        assert!(is_academic_email("someone@mit.edu"));
        assert!(is_academic_email("x@nsu.edu.bd"));
        assert!(!is_academic_email("rahim@gmail.com"));
        assert!(!is_academic_email("ac.bd"));
        assert!(!is_academic_email("@du.ac.bd"));
    }

    #[test]
    fn test_profile_coordinates_must_pair() {
        let request = UpdateProfileRequest {
            latitude: Some(23.8),
            ..Default::default()
        };
        assert!(!ProfileUpdateValidator.validate(&request).is_valid);

        let request = UpdateProfileRequest {
            latitude: Some(23.8),
            longitude: Some(90.4),
            ..Default::default()
        };
        assert!(ProfileUpdateValidator.validate(&request).is_valid);
    }

    #[test]
    fn test_teaching_details_rules() {
        let request = UpsertTutorRequest {
            teaching_details: Some(TeachingDetails {
                subjects: vec!["Physics".to_string(), " ".to_string()],
                salary_min: Some(8000),
                salary_max: Some(5000),
                days_per_week: Some(9),
                ..Default::default()
            }),
            ..Default::default()
        };
        let fields: Vec<String> = TutorDetailsValidator
            .validate(&request)
            .errors
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["subjects", "salary_max", "days_per_week"]);
    }
}
