// src/pitch/models.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Serialize, FromRow, PartialEq)]
pub struct AreaCount {
    pub area: String,
    pub tutors: i64,
}

/// Headline numbers for the presentation pages
#[derive(Debug, Serialize)]
pub struct PitchStats {
    pub tutors: i64,
    pub students: i64,
    pub verified_tutors: i64,
    pub active_contracts: i64,
    pub completed_sessions: i64,
    pub areas: Vec<AreaCount>,
}
