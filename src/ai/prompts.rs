//! Prompt text for the tutor assistant, ranking, zone naming, bios and ID cards.

use crate::discovery::models::TutorCandidate;

fn salary_range(tutor: &TutorCandidate) -> String {
    let details = &tutor.details.teaching_details;
    match (details.salary_min, details.salary_max) {
        (Some(min), Some(max)) => format!("{}-{} BDT", min, max),
        (Some(min), None) => format!("from {} BDT", min),
        (None, Some(max)) => format!("up to {} BDT", max),
        (None, None) => "negotiable".to_string(),
    }
}

fn join_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

/// One line per tutor: id, name, area, subjects, classes, salary, verification.
pub fn tutor_catalog(tutors: &[TutorCandidate], distances: &[Option<f64>]) -> String {
    tutors
        .iter()
        .enumerate()
        .map(|(i, tutor)| {
            let details = &tutor.details;
            let distance = distances
                .get(i)
                .copied()
                .flatten()
                .map(|d| format!(" | {:.1} km away", d))
                .unwrap_or_default();
            format!(
                "- id={} | {} | area: {} | subjects: {} | classes: {} | salary: {}{}{}",
                tutor.id,
                tutor.display_name(),
                details.primary_area.as_deref().unwrap_or("unknown"),
                join_or(&details.teaching_details.subjects, "not listed"),
                join_or(&details.teaching_details.classes, "any"),
                salary_range(tutor),
                if details.varsity_verified { " | verified" } else { "" },
                distance,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat_system_prompt(catalog: &str) -> String {
    format!(
        "You are ScholarGrid's assistant, helping students and guardians in Dhaka find home tutors.\n\
         Recommend only tutors from the list below, by name and area, and explain briefly why they fit.\n\
         If nobody fits, say so and suggest how to widen the search (another area, subject or budget).\n\
         Keep answers short and friendly. Salaries are monthly, in BDT.\n\n\
         Available tutors:\n{}",
        if catalog.is_empty() { "(none registered yet)" } else { catalog }
    )
}

pub fn ranking_system_prompt() -> &'static str {
    "You rank home tutors for a student's request. Reply with JSON only, in the form \
     {\"matches\": [{\"tutor_id\": \"<id from the list>\", \"match_score\": <0-100>, \"reason\": \"<one sentence>\"}]}. \
     Use only ids from the list, include only tutors that reasonably fit, best first."
}

pub fn ranking_user_prompt(query: &str, catalog: &str, zone: Option<&str>) -> String {
    let zone_line = zone
        .map(|z| format!("The student is looking in: {}\n", z))
        .unwrap_or_default();
    format!(
        "Student request: {}\n{}\nCandidate tutors:\n{}",
        query.trim(),
        zone_line,
        catalog
    )
}

pub fn zone_naming_prompt(display_name: &str, known_areas: &[String]) -> String {
    let known = if known_areas.is_empty() {
        String::new()
    } else {
        format!(
            "Prefer one of these names if it matches: {}.\n",
            known_areas.join(", ")
        )
    };
    format!(
        "Reverse-geocoded address in Dhaka: {}\n{}\
         Answer with only the neighbourhood name people in Dhaka use for this place \
         (for example Dhanmondi, Mirpur 10, Uttara Sector 7), nothing else.",
        display_name, known
    )
}

pub fn bio_prompt(text: &str) -> String {
    format!(
        "Write a warm, professional tutor bio of at most 80 words in first person, based on these notes. \
         Mention subjects, classes and teaching style if given. Do not invent degrees or results. \
         Return only the bio text.\n\nNotes:\n{}",
        text.trim()
    )
}

pub fn id_card_prompt() -> &'static str {
    "This is a photo of a university student ID card, probably from Bangladesh. \
     Return JSON with the keys \"name\", \"student_id\" and \"institution\". \
     Use null for anything you cannot read. Do not guess."
}
