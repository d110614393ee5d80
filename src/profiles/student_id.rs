//! University student ID parsing (`YY S DD NNN`, e.g. `21301245`).

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    Spring,
    Summer,
    Fall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentIdInfo {
    pub admission_year: u16,
    pub semester: Semester,
    pub department_code: String,
    pub serial: String,
}

fn student_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{2})([1-3])(\d{2})(\d{3})$").expect("student id regex")
    })
}

/// Parses an ID after dropping spaces and dashes. Returns `None` for anything
/// that is not eight digits with a valid semester digit.
pub fn parse_student_id(raw: &str) -> Option<StudentIdInfo> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let caps = student_id_pattern().captures(&cleaned)?;

    let year: u16 = caps[1].parse().ok()?;
    let semester = match &caps[2] {
        "1" => Semester::Spring,
        "2" => Semester::Summer,
        _ => Semester::Fall,
    };

    Some(StudentIdInfo {
        admission_year: 2000 + year,
        semester,
        department_code: caps[3].to_string(),
        serial: caps[4].to_string(),
    })
}
