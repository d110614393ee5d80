// src/applications/services.rs

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::models::*;
use crate::appointments::events::AppointmentEvents;
use crate::appointments::services::create_for_application;
use crate::auth::services::AuthService;
use crate::auth::{AuthedUser, Role};
use crate::common::{generate_application_id, now_rfc3339, ApiError};
use crate::discovery::matching::score_for_student;
use crate::discovery::services::DiscoveryService;
use crate::profiles::services::ProfilesService;

const APPLICATION_COLUMNS: &str =
    "id, sender_id, receiver_id, message, match_score, status, created_at, updated_at";

pub struct ApplicationsService {
    db: SqlitePool,
    events: AppointmentEvents,
}

impl ApplicationsService {
    pub fn new(db: SqlitePool, events: AppointmentEvents) -> Self {
        Self { db, events }
    }

    pub async fn find(&self, id: &str) -> Result<Application, ApiError> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = ?",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))
    }

    /// Score of the tutor against the student's saved preferences, 0 when
    /// either side has no details yet.
    async fn match_score(&self, student_id: &str, tutor_id: &str) -> Result<u32, ApiError> {
        let student = ProfilesService::new(self.db.clone())
            .find_student_details(student_id)
            .await?;
        let tutor = DiscoveryService::new(self.db.clone())
            .find_candidate(tutor_id)
            .await?;

        Ok(match (student, tutor) {
            (Some(student), Some(tutor)) => score_for_student(&tutor, &student),
            _ => 0,
        })
    }

    pub async fn create(
        &self,
        sender: &AuthedUser,
        request: &CreateApplicationRequest,
    ) -> Result<Application, ApiError> {
        let receiver_id = request.receiver_id.trim();
        if receiver_id == sender.id {
            return Err(ApiError::BadRequest(
                "You cannot apply to yourself".to_string(),
            ));
        }

        let receiver = AuthService::new(self.db.clone())
            .find_user(receiver_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Receiver not found".to_string()))?;

        if sender.role.counterpart() != Some(receiver.role()) {
            warn!(
                sender_id = %sender.id,
                sender_role = %sender.role,
                receiver_role = %receiver.role,
                "Application between incompatible roles"
            );
            return Err(ApiError::BadRequest(
                "Applications go between a student and a tutor".to_string(),
            ));
        }

        let pending: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM applications WHERE sender_id = ? AND receiver_id = ? AND status = 'pending'",
        )
        .bind(&sender.id)
        .bind(receiver_id)
        .fetch_optional(&self.db)
        .await?;
        if pending.is_some() {
            return Err(ApiError::Conflict(
                "You already have a pending application to this user".to_string(),
            ));
        }

        let (student_id, tutor_id) = match sender.role {
            Role::Student => (sender.id.as_str(), receiver_id),
            _ => (receiver_id, sender.id.as_str()),
        };
        let match_score = self.match_score(student_id, tutor_id).await?;
        debug!(student_id = %student_id, tutor_id = %tutor_id, match_score, "Application scored");

        let id = generate_application_id();
        let now = now_rfc3339();
        let inserted = sqlx::query(
            r#"
            INSERT INTO applications (id, sender_id, receiver_id, message, match_score, status,
                                      created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&sender.id)
        .bind(receiver_id)
        .bind(request.message.trim())
        .bind(match_score as i64)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.is_unique_violation() {
                return Err(ApiError::Conflict(
                    "You already have a pending application to this user".to_string(),
                ));
            }
        }
        inserted?;

        info!(
            application_id = %id,
            sender_id = %sender.id,
            receiver_id = %receiver_id,
            match_score,
            "Application sent"
        );
        self.find(&id).await
    }

    pub async fn list(
        &self,
        user_id: &str,
        mailbox: Mailbox,
    ) -> Result<Vec<Application>, ApiError> {
        let column = match mailbox {
            Mailbox::Sent => "sender_id",
            Mailbox::Received => "receiver_id",
        };
        let rows = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE {} = ? ORDER BY created_at DESC, id",
            APPLICATION_COLUMNS, column
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Accepts or rejects a pending application. Accepting schedules the
    /// first meeting in the same transaction.
    pub async fn respond(
        &self,
        id: &str,
        user_id: &str,
        accept: bool,
    ) -> Result<ApplicationDecision, ApiError> {
        let application = self.find(id).await?;
        if application.receiver_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the receiver can respond to an application".to_string(),
            ));
        }
        if application.status != STATUS_PENDING {
            return Err(ApiError::BadRequest(format!(
                "Application is already {}",
                application.status
            )));
        }

        let sender_is_student = AuthService::new(self.db.clone())
            .find_user(&application.sender_id)
            .await?
            .map(|u| u.role() == Role::Student)
            .unwrap_or(false);

        let new_status = if accept { STATUS_ACCEPTED } else { STATUS_REJECTED };
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "UPDATE applications SET status = ?, updated_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(new_status)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "Application was answered concurrently".to_string(),
            ));
        }

        let appointment = if accept {
            let (student_id, tutor_id) = if sender_is_student {
                (&application.sender_id, &application.receiver_id)
            } else {
                (&application.receiver_id, &application.sender_id)
            };
            Some(create_for_application(&mut tx, id, student_id, tutor_id).await?)
        } else {
            None
        };

        tx.commit().await?;

        if let Some(appointment) = &appointment {
            self.events.publish(appointment);
        }
        info!(application_id = %id, status = %new_status, "Application answered");

        Ok(ApplicationDecision {
            application: self.find(id).await?,
            appointment,
        })
    }
}
