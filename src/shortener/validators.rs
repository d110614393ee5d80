// src/shortener/validators.rs

use regex::Regex;
use std::sync::OnceLock;

use super::models::{CreateShortLinkRequest, MAX_URL_CHARS};
use crate::common::validation::{ValidationResult, Validator};

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{3,32}$").expect("slug regex"))
}

pub fn is_valid_custom_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

/// Only absolute http(s) URLs with a host are shortened.
pub fn is_shortenable_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

impl Validator<CreateShortLinkRequest> for CreateShortLinkRequest {
    fn validate(&self, request: &CreateShortLinkRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        let url = request.url.trim();

        if url.is_empty() {
            result.add_error("url", "is required");
        } else if url.chars().count() > MAX_URL_CHARS {
            result.add_error("url", &format!("must be at most {} characters", MAX_URL_CHARS));
        } else if !is_shortenable_url(url) {
            result.add_error("url", "must be an http or https URL");
        }

        if let Some(slug) = &request.slug {
            if !is_valid_custom_slug(slug.trim()) {
                result.add_error(
                    "slug",
                    "must be 3-32 letters, digits, '-' or '_'",
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_slug_rules() {
        assert!(is_valid_custom_slug("math-101"));
        assert!(is_valid_custom_slug("abc"));
        assert!(!is_valid_custom_slug("ab"));
        assert!(!is_valid_custom_slug("has space"));
        assert!(!is_valid_custom_slug(&"x".repeat(33)));
        assert!(!is_valid_custom_slug("ঢাকা"));
    }

    #[test]
    fn test_shortenable_urls() {
        assert!(is_shortenable_url("https://scholargrid.app/tutors?area=mirpur"));
        assert!(is_shortenable_url("http://example.com"));
        assert!(!is_shortenable_url("javascript:alert(1)"));
        assert!(!is_shortenable_url("ftp://example.com/file"));
        assert!(!is_shortenable_url("not a url"));
    }
}
