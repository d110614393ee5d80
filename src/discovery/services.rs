// src/discovery/services.rs

use sqlx::SqlitePool;
use tracing::debug;

use super::models::{TutorCandidate, TutorListingRow};
use crate::common::ApiError;

pub struct DiscoveryService {
    db: SqlitePool,
}

impl DiscoveryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All tutor accounts with their parsed details.
    pub async fn load_candidates(&self) -> Result<Vec<TutorCandidate>, ApiError> {
        let rows = sqlx::query_as::<_, TutorListingRow>(
            r#"
            SELECT t.id, t.basic_info, t.teaching_details, t.varsity_infos, t.varsity_verified,
                   t.bio, t.primary_area, t.location, t.latitude, t.longitude, t.updated_at,
                   p.username, p.is_online
            FROM tutors t
            JOIN profiles p ON p.id = t.id
            JOIN users u ON u.id = t.id
            WHERE u.role = 'tutor'
            ORDER BY t.id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        debug!(count = rows.len(), "Loaded tutor candidates");
        Ok(rows.into_iter().map(TutorCandidate::from).collect())
    }

    pub async fn find_candidate(&self, tutor_id: &str) -> Result<Option<TutorCandidate>, ApiError> {
        let row = sqlx::query_as::<_, TutorListingRow>(
            r#"
            SELECT t.id, t.basic_info, t.teaching_details, t.varsity_infos, t.varsity_verified,
                   t.bio, t.primary_area, t.location, t.latitude, t.longitude, t.updated_at,
                   p.username, p.is_online
            FROM tutors t
            JOIN profiles p ON p.id = t.id
            WHERE t.id = ?
            "#,
        )
        .bind(tutor_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(TutorCandidate::from))
    }

    /// Distinct tutor areas, used as the zone vocabulary for free-text search.
    pub async fn known_areas(&self) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT TRIM(primary_area) FROM tutors
            WHERE primary_area IS NOT NULL AND TRIM(primary_area) != ''
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(area,)| area).collect())
    }
}
