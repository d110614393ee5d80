// src/discovery/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::geo::Coordinates;
use crate::profiles::models::{TutorDetails, TutorRow};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

/// Manual search criteria, all optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    pub subject: Option<String>,
    pub class_level: Option<String>,
    pub area: Option<String>,
    pub gender: Option<String>,
    pub max_salary: Option<i64>,
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng")]
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub verified_only: bool,
    pub limit: Option<usize>,
}

impl SearchFilters {
    pub fn origin(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyQuery {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TutorListingRow {
    #[sqlx(flatten)]
    pub tutor: TutorRow,
    pub username: String,
    pub is_online: bool,
}

/// A tutor as seen by discovery: profile basics plus parsed details
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TutorCandidate {
    pub id: String,
    pub username: String,
    pub is_online: bool,
    pub details: TutorDetails,
}

impl From<TutorListingRow> for TutorCandidate {
    fn from(row: TutorListingRow) -> Self {
        let details = TutorDetails::from(row.tutor);
        Self {
            id: details.user_id.clone(),
            username: row.username,
            is_online: row.is_online,
            details,
        }
    }
}

impl TutorCandidate {
    /// Display name: full name when set, username otherwise
    pub fn display_name(&self) -> &str {
        self.details
            .basic_info
            .full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedTutor {
    pub tutor: TutorCandidate,
    pub match_score: u32,
    pub distance_km: Option<f64>,
}
