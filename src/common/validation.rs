// Common validation types and traits

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Records an error when the trimmed value's char count is outside `min..=max`.
    pub fn check_length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min {
            if min == 1 {
                self.add_error(field, "is required");
            } else {
                self.add_error(field, &format!("must be at least {} characters", min));
            }
        } else if len > max {
            self.add_error(field, &format!("must be at most {} characters", max));
        }
    }

    pub fn check_range<T>(&mut self, field: &str, value: T, min: T, max: T)
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            self.add_error(field, &format!("must be between {} and {}", min, max));
        }
    }

    /// Converts into `Err(ApiError)` when any check failed.
    pub fn into_result(self) -> Result<(), super::ApiError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}
