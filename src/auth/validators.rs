use super::models::{RegisterRequest, Role, UpgradeRequest};
use crate::common::{ValidationResult, Validator};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Usernames are 3..=32 chars of `[a-zA-Z0-9_.-]`.
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=32).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
                && email.len() <= 254
        }
        None => false,
    }
}

fn check_credentials(result: &mut ValidationResult, email: &str, password: &str, role: &str) {
    if !is_valid_email(email) {
        result.add_error("email", "Email must be a valid address");
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        result.add_error("password", "Password must be at least 8 characters");
    } else if password.len() > 128 {
        result.add_error("password", "Password must not exceed 128 characters");
    }

    match role.parse::<Role>() {
        Ok(role) if role.is_member() => {}
        _ => result.add_error("role", "Role must be 'student' or 'tutor'"),
    }
}

impl Validator<RegisterRequest> for RegisterRequest {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_credentials(&mut result, &data.email, &data.password, &data.role);

        if !is_valid_username(data.username.trim()) {
            result.add_error(
                "username",
                "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
            );
        }

        result
    }
}

impl Validator<UpgradeRequest> for UpgradeRequest {
    fn validate(&self, data: &UpgradeRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_credentials(&mut result, &data.email, &data.password, &data.role);
        result
    }
}
