//! Preference matching and proximity ranking for tutors.
//!
//! Scores are out of 100: subject 40, class 15, area 20, distance up to 15,
//! varsity verification 10. A component only scores when the searcher asked
//! for it (or, for applications, when the student listed it).

use std::cmp::Ordering;

use super::models::{RankedTutor, SearchFilters, TutorCandidate};
use crate::common::geo::{haversine_km, round_km, Coordinates};
use crate::profiles::models::StudentDetails;

pub const SUBJECT_POINTS: f64 = 40.0;
pub const CLASS_POINTS: f64 = 15.0;
pub const AREA_POINTS: f64 = 20.0;
pub const DISTANCE_POINTS: f64 = 15.0;
pub const VERIFIED_POINTS: f64 = 10.0;

/// Distance decay range when the search has no radius.
pub const DEFAULT_DECAY_KM: f64 = 10.0;

/// Normalised criteria shared by manual search and application scoring.
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    pub subjects: Vec<String>,
    pub classes: Vec<String>,
    pub areas: Vec<String>,
    pub gender: Option<String>,
    pub max_salary: Option<i64>,
    pub origin: Option<Coordinates>,
    pub radius_km: Option<f64>,
    pub verified_only: bool,
}

fn lowered(values: impl IntoIterator<Item = String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

impl From<&SearchFilters> for MatchCriteria {
    fn from(filters: &SearchFilters) -> Self {
        Self {
            subjects: lowered(filters.subject.clone()),
            classes: lowered(filters.class_level.clone()),
            areas: lowered(filters.area.clone()),
            gender: filters
                .gender
                .as_deref()
                .map(|g| g.trim().to_lowercase())
                .filter(|g| !g.is_empty()),
            max_salary: filters.max_salary,
            origin: filters.origin().filter(Coordinates::is_valid),
            radius_km: filters.radius_km.filter(|r| *r > 0.0),
            verified_only: filters.verified_only,
        }
    }
}

impl From<&StudentDetails> for MatchCriteria {
    fn from(student: &StudentDetails) -> Self {
        let prefs = &student.teaching_details;
        let areas = prefs
            .preferred_areas
            .iter()
            .cloned()
            .chain(student.primary_area.clone());
        Self {
            subjects: lowered(prefs.subjects.iter().cloned()),
            classes: lowered(prefs.classes.iter().cloned()),
            areas: lowered(areas),
            gender: prefs.preferred_gender.as_deref().map(|g| g.trim().to_lowercase()),
            max_salary: prefs.salary_max,
            origin: student.coordinates().filter(Coordinates::is_valid),
            radius_km: None,
            verified_only: false,
        }
    }
}

/// Per-criterion outcome for one tutor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchBreakdown {
    pub subject: bool,
    pub class: bool,
    pub area: bool,
    pub distance_km: Option<f64>,
    pub verified: bool,
}

impl MatchBreakdown {
    fn distance_points(&self, criteria: &MatchCriteria) -> f64 {
        let decay = criteria.radius_km.unwrap_or(DEFAULT_DECAY_KM);
        match self.distance_km {
            Some(d) if decay > 0.0 => DISTANCE_POINTS * (1.0 - d / decay).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn score(&self, criteria: &MatchCriteria) -> u32 {
        let mut total = 0.0;
        if self.subject {
            total += SUBJECT_POINTS;
        }
        if self.class {
            total += CLASS_POINTS;
        }
        if self.area {
            total += AREA_POINTS;
        }
        total += self.distance_points(criteria);
        if self.verified {
            total += VERIFIED_POINTS;
        }
        total.round().clamp(0.0, 100.0) as u32
    }
}

fn any_contains(haystack: &[String], needles: &[String]) -> bool {
    haystack.iter().any(|h| {
        let h = h.to_lowercase();
        needles.iter().any(|n| h.contains(n.as_str()))
    })
}

fn any_equals(haystack: &[String], needles: &[String]) -> bool {
    haystack
        .iter()
        .any(|h| needles.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

pub fn evaluate(tutor: &TutorCandidate, criteria: &MatchCriteria) -> MatchBreakdown {
    let details = &tutor.details;
    let teaching = &details.teaching_details;

    let tutor_areas: Vec<String> = teaching
        .preferred_areas
        .iter()
        .cloned()
        .chain(details.primary_area.clone())
        .collect();

    MatchBreakdown {
        subject: !criteria.subjects.is_empty() && any_contains(&teaching.subjects, &criteria.subjects),
        class: !criteria.classes.is_empty() && any_equals(&teaching.classes, &criteria.classes),
        area: !criteria.areas.is_empty() && any_equals(&tutor_areas, &criteria.areas),
        distance_km: match (criteria.origin, details.coordinates()) {
            (Some(origin), Some(point)) => Some(haversine_km(origin, point)),
            _ => None,
        },
        verified: details.varsity_verified,
    }
}

/// Whether a tutor passes every hard filter in the criteria.
fn passes(tutor: &TutorCandidate, criteria: &MatchCriteria, breakdown: &MatchBreakdown) -> bool {
    let details = &tutor.details;

    if !criteria.subjects.is_empty() && !breakdown.subject {
        return false;
    }
    if !criteria.classes.is_empty() && !breakdown.class {
        return false;
    }
    if !criteria.areas.is_empty() && !breakdown.area {
        return false;
    }
    if let Some(gender) = &criteria.gender {
        let matches = details
            .basic_info
            .gender
            .as_deref()
            .map(|g| g.trim().eq_ignore_ascii_case(gender))
            .unwrap_or(false);
        if !matches {
            return false;
        }
    }
    if let (Some(max), Some(min)) = (criteria.max_salary, details.teaching_details.salary_min) {
        if min > max {
            return false;
        }
    }
    if let (Some(radius), Some(_)) = (criteria.radius_km, criteria.origin) {
        match breakdown.distance_km {
            Some(d) if d <= radius => {}
            _ => return false,
        }
    }
    if criteria.verified_only && !details.varsity_verified {
        return false;
    }
    true
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filters candidates and orders them by score desc, distance asc (unknown
/// last), then id.
pub fn filter_and_rank(candidates: Vec<TutorCandidate>, filters: &SearchFilters) -> Vec<RankedTutor> {
    let criteria = MatchCriteria::from(filters);
    let mut ranked: Vec<RankedTutor> = candidates
        .into_iter()
        .filter_map(|tutor| {
            let breakdown = evaluate(&tutor, &criteria);
            passes(&tutor, &criteria, &breakdown).then(|| RankedTutor {
                match_score: breakdown.score(&criteria),
                distance_km: breakdown.distance_km.map(round_km),
                tutor,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| compare_distance(a.distance_km, b.distance_km))
            .then_with(|| a.tutor.id.cmp(&b.tutor.id))
    });
    ranked.truncate(filters.effective_limit());
    ranked
}

/// Tutors with coordinates within `radius_km` of `origin`, nearest first.
pub fn nearby(
    candidates: Vec<TutorCandidate>,
    origin: Coordinates,
    radius_km: f64,
    limit: usize,
) -> Vec<RankedTutor> {
    let criteria = MatchCriteria {
        origin: Some(origin),
        radius_km: Some(radius_km),
        ..Default::default()
    };
    let mut ranked: Vec<RankedTutor> = candidates
        .into_iter()
        .filter_map(|tutor| {
            let distance = haversine_km(origin, tutor.details.coordinates()?);
            (distance <= radius_km).then(|| {
                let breakdown = evaluate(&tutor, &criteria);
                RankedTutor {
                    match_score: breakdown.score(&criteria),
                    distance_km: Some(round_km(distance)),
                    tutor,
                }
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        compare_distance(a.distance_km, b.distance_km).then_with(|| a.tutor.id.cmp(&b.tutor.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Score a tutor against a student's saved preferences.
pub fn score_for_student(tutor: &TutorCandidate, student: &StudentDetails) -> u32 {
    let criteria = MatchCriteria::from(student);
    evaluate(tutor, &criteria).score(&criteria)
}
