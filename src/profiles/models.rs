// src/profiles/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::geo::Coordinates;
use crate::common::parse_json_column;

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub role: String,
    pub primary_area: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_online: bool,
    pub updated_at: String,
}

impl Profile {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub primary_area: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub is_online: bool,
}

// ============================================================================
// JSON detail columns
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BasicInfo {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TeachingDetails {
    pub subjects: Vec<String>,
    pub classes: Vec<String>,
    pub medium: Option<String>,
    pub preferred_areas: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub days_per_week: Option<i64>,
    pub preferred_gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VarsityInfo {
    pub university: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// Role details
// ============================================================================

/// Raw `tutors` row; JSON columns still as text.
#[derive(Debug, Clone, FromRow)]
pub struct TutorRow {
    pub id: String,
    pub basic_info: Option<String>,
    pub teaching_details: Option<String>,
    pub varsity_infos: Option<String>,
    pub varsity_verified: bool,
    pub bio: Option<String>,
    pub primary_area: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TutorDetails {
    pub user_id: String,
    pub basic_info: BasicInfo,
    pub teaching_details: TeachingDetails,
    pub varsity_infos: Vec<VarsityInfo>,
    pub varsity_verified: bool,
    pub bio: Option<String>,
    pub primary_area: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: String,
}

impl From<TutorRow> for TutorDetails {
    fn from(row: TutorRow) -> Self {
        Self {
            basic_info: parse_json_column(row.basic_info.as_deref(), "tutors.basic_info"),
            teaching_details: parse_json_column(
                row.teaching_details.as_deref(),
                "tutors.teaching_details",
            ),
            varsity_infos: parse_json_column(row.varsity_infos.as_deref(), "tutors.varsity_infos"),
            user_id: row.id,
            varsity_verified: row.varsity_verified,
            bio: row.bio,
            primary_area: row.primary_area,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            updated_at: row.updated_at,
        }
    }
}

impl TutorDetails {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    pub id: String,
    pub basic_info: Option<String>,
    pub teaching_details: Option<String>,
    pub primary_area: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: String,
}

/// Student preferences. `teaching_details` holds what the student is looking for.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentDetails {
    pub user_id: String,
    pub basic_info: BasicInfo,
    pub teaching_details: TeachingDetails,
    pub primary_area: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: String,
}

impl From<StudentRow> for StudentDetails {
    fn from(row: StudentRow) -> Self {
        Self {
            basic_info: parse_json_column(row.basic_info.as_deref(), "students.basic_info"),
            teaching_details: parse_json_column(
                row.teaching_details.as_deref(),
                "students.teaching_details",
            ),
            user_id: row.id,
            primary_area: row.primary_area,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            updated_at: row.updated_at,
        }
    }
}

impl StudentDetails {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UpsertTutorRequest {
    pub basic_info: Option<BasicInfo>,
    pub teaching_details: Option<TeachingDetails>,
    pub varsity_infos: Option<Vec<VarsityInfo>>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpsertStudentRequest {
    pub basic_info: Option<BasicInfo>,
    pub teaching_details: Option<TeachingDetails>,
}

// ============================================================================
// Varsity verification
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VarsityCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VarsityVerifyRequest {
    pub code: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub code: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct StudentIdRequest {
    pub student_id: String,
}

/// Public tutor card: profile, details and reputation
#[derive(Debug, Serialize)]
pub struct TutorCard {
    pub profile: Profile,
    pub details: TutorDetails,
    pub reputation: crate::reviews::models::Reputation,
}
