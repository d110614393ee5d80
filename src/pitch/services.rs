// src/pitch/services.rs

use sqlx::SqlitePool;

use super::models::{AreaCount, PitchStats};
use crate::common::ApiError;

const TOP_AREAS: i64 = 10;

pub struct PitchService {
    db: SqlitePool,
}

impl PitchService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn count(&self, sql: &str) -> Result<i64, ApiError> {
        Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.db).await?)
    }

    pub async fn stats(&self) -> Result<PitchStats, ApiError> {
        let tutors = self
            .count("SELECT COUNT(*) FROM users WHERE role = 'tutor' AND is_anonymous = 0")
            .await?;
        let students = self
            .count("SELECT COUNT(*) FROM users WHERE role = 'student' AND is_anonymous = 0")
            .await?;
        let verified_tutors = self
            .count("SELECT COUNT(*) FROM tutors WHERE varsity_verified = 1")
            .await?;
        let active_contracts = self
            .count("SELECT COUNT(*) FROM contracts WHERE status = 'active'")
            .await?;
        let completed_sessions = self
            .count("SELECT COUNT(*) FROM appointments WHERE status = 'completed'")
            .await?;

        // Tutors per neighbourhood, busiest first
        let areas = sqlx::query_as::<_, AreaCount>(
            r#"
            SELECT TRIM(primary_area) AS area, COUNT(*) AS tutors
            FROM profiles
            WHERE role = 'tutor' AND primary_area IS NOT NULL AND TRIM(primary_area) != ''
            GROUP BY TRIM(primary_area)
            ORDER BY tutors DESC, area
            LIMIT ?
            "#,
        )
        .bind(TOP_AREAS)
        .fetch_all(&self.db)
        .await?;

        Ok(PitchStats {
            tutors,
            students,
            verified_tutors,
            active_contracts,
            completed_sessions,
            areas,
        })
    }
}
