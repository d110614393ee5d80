// src/profiles/services.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::models::*;
use super::validators::{
    is_academic_email, ProfileUpdateValidator, StudentDetailsValidator, TutorDetailsValidator,
};
use crate::common::{
    generate_numeric_code, generate_verification_id, now_rfc3339, safe_email_log, to_json_column,
    ApiError, Validator,
};

/// Varsity verification codes stay valid this long.
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;

const TUTOR_COLUMNS: &str = "id, basic_info, teaching_details, varsity_infos, varsity_verified, bio, \
     primary_area, location, latitude, longitude, updated_at";
const STUDENT_COLUMNS: &str =
    "id, basic_info, teaching_details, primary_area, location, latitude, longitude, updated_at";

pub struct ProfilesService {
    db: SqlitePool,
}

impl ProfilesService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Profile
    // ============================================================================

    pub async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, ApiError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, role, primary_area, location, latitude, longitude, is_online, updated_at
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, ApiError> {
        self.find_profile(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, ApiError> {
        ProfileUpdateValidator.validate(request).into_result()?;

        if let Some(username) = &request.username {
            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM profiles WHERE username = ? AND id != ?")
                    .bind(username.trim())
                    .bind(user_id)
                    .fetch_optional(&self.db)
                    .await?;
            if taken.is_some() {
                return Err(ApiError::Conflict("Username is already taken".to_string()));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                username = COALESCE(?, username),
                primary_area = COALESCE(?, primary_area),
                location = COALESCE(?, location),
                latitude = COALESCE(?, latitude),
                longitude = COALESCE(?, longitude),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.username.as_deref().map(str::trim))
        .bind(request.primary_area.as_deref().map(str::trim))
        .bind(request.location.as_deref().map(str::trim))
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(now_rfc3339())
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Profile not found".to_string()));
        }

        self.mirror_location(user_id).await?;
        info!(user_id = %user_id, "Profile updated");
        self.get_profile(user_id).await
    }

    pub async fn set_presence(&self, user_id: &str, is_online: bool) -> Result<Profile, ApiError> {
        sqlx::query("UPDATE profiles SET is_online = ?, updated_at = ? WHERE id = ?")
            .bind(is_online)
            .bind(now_rfc3339())
            .bind(user_id)
            .execute(&self.db)
            .await?;
        self.get_profile(user_id).await
    }

    /// Copies the profile's area and coordinates into whichever details row exists.
    async fn mirror_location(&self, user_id: &str) -> Result<(), ApiError> {
        for table in ["tutors", "students"] {
            sqlx::query(&format!(
                r#"
                UPDATE {table} SET
                    primary_area = (SELECT primary_area FROM profiles WHERE id = ?1),
                    location = (SELECT location FROM profiles WHERE id = ?1),
                    latitude = (SELECT latitude FROM profiles WHERE id = ?1),
                    longitude = (SELECT longitude FROM profiles WHERE id = ?1)
                WHERE id = ?1
                "#
            ))
            .bind(user_id)
            .execute(&self.db)
            .await?;
        }
        Ok(())
    }

    // ============================================================================
    // Tutor / student details
    // ============================================================================

    pub async fn find_tutor_details(&self, user_id: &str) -> Result<Option<TutorDetails>, ApiError> {
        let row = sqlx::query_as::<_, TutorRow>(&format!(
            "SELECT {} FROM tutors WHERE id = ?",
            TUTOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(TutorDetails::from))
    }

    pub async fn find_student_details(
        &self,
        user_id: &str,
    ) -> Result<Option<StudentDetails>, ApiError> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE id = ?",
            STUDENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(StudentDetails::from))
    }

    pub async fn upsert_tutor_details(
        &self,
        user_id: &str,
        request: &UpsertTutorRequest,
    ) -> Result<TutorDetails, ApiError> {
        TutorDetailsValidator.validate(request).into_result()?;

        sqlx::query(
            r#"
            INSERT INTO tutors (id, basic_info, teaching_details, varsity_infos, bio, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                basic_info = COALESCE(excluded.basic_info, basic_info),
                teaching_details = COALESCE(excluded.teaching_details, teaching_details),
                varsity_infos = COALESCE(excluded.varsity_infos, varsity_infos),
                bio = COALESCE(excluded.bio, bio),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(request.basic_info.as_ref().map(to_json_column))
        .bind(request.teaching_details.as_ref().map(to_json_column))
        .bind(request.varsity_infos.as_ref().map(to_json_column))
        .bind(request.bio.as_deref().map(str::trim))
        .bind(now_rfc3339())
        .execute(&self.db)
        .await?;

        self.mirror_location(user_id).await?;
        info!(user_id = %user_id, "Tutor details saved");

        self.find_tutor_details(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Tutor not found".to_string()))
    }

    pub async fn upsert_student_details(
        &self,
        user_id: &str,
        request: &UpsertStudentRequest,
    ) -> Result<StudentDetails, ApiError> {
        StudentDetailsValidator.validate(request).into_result()?;

        sqlx::query(
            r#"
            INSERT INTO students (id, basic_info, teaching_details, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                basic_info = COALESCE(excluded.basic_info, basic_info),
                teaching_details = COALESCE(excluded.teaching_details, teaching_details),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(request.basic_info.as_ref().map(to_json_column))
        .bind(request.teaching_details.as_ref().map(to_json_column))
        .bind(now_rfc3339())
        .execute(&self.db)
        .await?;

        self.mirror_location(user_id).await?;
        info!(user_id = %user_id, "Student details saved");

        self.find_student_details(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
    }

    // ============================================================================
    // Varsity verification
    // ============================================================================

    /// Stores a fresh code for the user, replacing older ones. Returns the code
    /// and its expiry so the caller can hand it to the mailer.
    pub async fn issue_varsity_code(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<VerificationCode, ApiError> {
        let email = email.trim().to_lowercase();
        if !is_academic_email(&email) {
            warn!(user_id = %user_id, email = %safe_email_log(&email), "Rejected non-academic verification email");
            return Err(ApiError::BadRequest(
                "A university email address (.edu or .ac domain) is required".to_string(),
            ));
        }

        let now = Utc::now();
        let code = VerificationCode {
            id: generate_verification_id(),
            user_id: user_id.to_string(),
            email,
            code: generate_numeric_code(6),
            expires_at: (now + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES)).to_rfc3339(),
            created_at: now.to_rfc3339(),
        };

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM verification_codes WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO verification_codes (id, user_id, email, code, expires_at, consumed, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&code.id)
        .bind(&code.user_id)
        .bind(&code.email)
        .bind(&code.code)
        .bind(&code.expires_at)
        .bind(&code.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(user_id = %user_id, email = %safe_email_log(&code.email), "Varsity verification code issued");
        Ok(code)
    }

    /// Consumes a matching unexpired code and marks the tutor verified.
    pub async fn verify_varsity_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<TutorDetails, ApiError> {
        let stored = sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT id, user_id, email, code, expires_at, created_at
            FROM verification_codes
            WHERE user_id = ? AND consumed = 0
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let invalid = || ApiError::BadRequest("Invalid or expired verification code".to_string());
        let stored = stored.ok_or_else(invalid)?;

        let expired = DateTime::parse_from_rfc3339(&stored.expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired || stored.code != code.trim() {
            warn!(user_id = %user_id, expired = expired, "Varsity verification failed");
            return Err(invalid());
        }

        let now = now_rfc3339();
        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE verification_codes SET consumed = 1 WHERE id = ?")
            .bind(&stored.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO tutors (id, varsity_verified, updated_at) VALUES (?, 1, ?)
            ON CONFLICT(id) DO UPDATE SET varsity_verified = 1, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(user_id = %user_id, "Tutor varsity email verified");
        self.find_tutor_details(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Tutor not found".to_string()))
    }
}
