// src/appointments/services.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use super::events::AppointmentEvents;
use super::models::*;
use crate::common::{generate_appointment_id, generate_numeric_code, now_rfc3339, ApiError};

const APPOINTMENT_COLUMNS: &str = r#"
    id, application_id, student_id, tutor_id, status, meeting_otp, otp_expires_at,
    is_verified_onsite, payment_status, session_status, created_at, updated_at
"#;

/// Creates the meeting for a freshly accepted application.
pub async fn create_for_application(
    tx: &mut Transaction<'_, Sqlite>,
    application_id: &str,
    student_id: &str,
    tutor_id: &str,
) -> Result<Appointment, ApiError> {
    let id = generate_appointment_id();
    let now = now_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO appointments (id, application_id, student_id, tutor_id, status,
                                  created_at, updated_at)
        VALUES (?, ?, ?, ?, 'scheduled', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(application_id)
    .bind(student_id)
    .bind(tutor_id)
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    let appointment = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {} FROM appointments WHERE id = ?",
        APPOINTMENT_COLUMNS
    ))
    .bind(&id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(appointment)
}

fn otp_expired(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    match expires_at.and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
        Some(expiry) => expiry.with_timezone(&Utc) <= now,
        None => true,
    }
}

pub struct AppointmentsService {
    db: SqlitePool,
    events: AppointmentEvents,
}

impl AppointmentsService {
    pub fn new(db: SqlitePool, events: AppointmentEvents) -> Self {
        Self { db, events }
    }

    pub async fn find(&self, id: &str) -> Result<Appointment, ApiError> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE id = ?",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))
    }

    /// Loads the appointment and checks the caller takes part in it.
    async fn find_for(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<(Appointment, Participant), ApiError> {
        let appointment = self.find(id).await?;
        match appointment.participant(user_id) {
            Some(participant) => Ok((appointment, participant)),
            None => Err(ApiError::Forbidden(
                "You are not part of this appointment".to_string(),
            )),
        }
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, ApiError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE student_id = ?1 OR tutor_id = ?1
            ORDER BY created_at DESC
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|a| a.for_viewer(user_id)).collect())
    }

    async fn publish_current(&self, id: &str) -> Result<Appointment, ApiError> {
        let appointment = self.find(id).await?;
        self.events.publish(&appointment);
        Ok(appointment)
    }

    /// Issues a fresh OTP, replacing any earlier one.
    pub async fn issue_otp(&self, id: &str, user_id: &str) -> Result<Appointment, ApiError> {
        let (appointment, participant) = self.find_for(id, user_id).await?;
        if participant != Participant::Student {
            return Err(ApiError::Forbidden(
                "Only the student can generate a meeting code".to_string(),
            ));
        }
        if appointment.status != STATUS_SCHEDULED {
            return Err(ApiError::BadRequest(format!(
                "Appointment is {}, codes are only issued for scheduled meetings",
                appointment.status
            )));
        }

        let otp = generate_numeric_code(OTP_LENGTH);
        let expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).to_rfc3339();

        sqlx::query(
            "UPDATE appointments SET meeting_otp = ?, otp_expires_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&otp)
        .bind(&expires_at)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        info!(appointment_id = %id, "Meeting code issued");
        self.find(id).await
    }

    /// Current unexpired OTP for the student's QR.
    pub async fn current_otp(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<(String, String), ApiError> {
        let (appointment, participant) = self.find_for(id, user_id).await?;
        if participant != Participant::Student {
            return Err(ApiError::Forbidden(
                "Only the student can show the meeting code".to_string(),
            ));
        }
        match (appointment.meeting_otp, appointment.otp_expires_at) {
            (Some(otp), Some(expires_at)) if !otp_expired(Some(&expires_at), Utc::now()) => {
                Ok((otp, expires_at))
            }
            _ => Err(ApiError::NotFound(
                "No active meeting code, generate a new one".to_string(),
            )),
        }
    }

    /// Tutor confirms the in-person meeting with the student's code.
    /// The code is consumed on success.
    pub async fn verify_otp(
        &self,
        id: &str,
        user_id: &str,
        otp: &str,
    ) -> Result<Appointment, ApiError> {
        let (appointment, participant) = self.find_for(id, user_id).await?;
        if participant != Participant::Tutor {
            return Err(ApiError::Forbidden(
                "Only the tutor can verify the meeting".to_string(),
            ));
        }
        if appointment.status != STATUS_SCHEDULED {
            return Err(ApiError::BadRequest(format!(
                "Appointment is already {}",
                appointment.status
            )));
        }

        let otp = otp.trim();
        let matches = appointment.meeting_otp.as_deref() == Some(otp);
        if !matches || otp_expired(appointment.otp_expires_at.as_deref(), Utc::now()) {
            warn!(appointment_id = %id, tutor_id = %user_id, "Meeting code rejected");
            return Err(ApiError::BadRequest(
                "Invalid or expired meeting code".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = ?, session_status = ?, is_verified_onsite = 1,
                meeting_otp = NULL, otp_expires_at = NULL, updated_at = ?
            WHERE id = ? AND status = 'scheduled' AND meeting_otp = ?
            "#,
        )
        .bind(STATUS_VERIFIED)
        .bind(SESSION_IN_PROGRESS)
        .bind(now_rfc3339())
        .bind(id)
        .bind(otp)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "Meeting code was already used".to_string(),
            ));
        }

        info!(appointment_id = %id, tutor_id = %user_id, "Meeting verified on site");
        self.publish_current(id).await
    }

    pub async fn complete(&self, id: &str, user_id: &str) -> Result<Appointment, ApiError> {
        let (appointment, _) = self.find_for(id, user_id).await?;
        if appointment.status != STATUS_VERIFIED {
            return Err(ApiError::BadRequest(
                "Only verified meetings can be completed".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE appointments SET status = ?, session_status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(STATUS_COMPLETED)
        .bind(SESSION_ENDED)
        .bind(now_rfc3339())
        .bind(id)
        .bind(STATUS_VERIFIED)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "Appointment changed while completing it".to_string(),
            ));
        }

        info!(appointment_id = %id, user_id = %user_id, "Appointment completed");
        self.publish_current(id).await
    }

    pub async fn cancel(&self, id: &str, user_id: &str) -> Result<Appointment, ApiError> {
        let (appointment, _) = self.find_for(id, user_id).await?;
        if appointment.status != STATUS_SCHEDULED {
            return Err(ApiError::BadRequest(
                "Only scheduled meetings can be cancelled".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = ?, meeting_otp = NULL, otp_expires_at = NULL, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(STATUS_CANCELLED)
        .bind(now_rfc3339())
        .bind(id)
        .bind(STATUS_SCHEDULED)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "Appointment changed while cancelling it".to_string(),
            ));
        }

        info!(appointment_id = %id, user_id = %user_id, "Appointment cancelled");
        self.publish_current(id).await
    }

    /// Students mark a payment as sent, tutors confirm receipt.
    pub async fn set_payment_status(
        &self,
        id: &str,
        user_id: &str,
        payment_status: &str,
    ) -> Result<Appointment, ApiError> {
        let (appointment, participant) = self.find_for(id, user_id).await?;

        match (participant, payment_status) {
            (Participant::Student, PAYMENT_PENDING) | (Participant::Tutor, PAYMENT_PAID) => {}
            (_, PAYMENT_PENDING) | (_, PAYMENT_PAID) => {
                return Err(ApiError::Forbidden(format!(
                    "You cannot set payment status to '{}'",
                    payment_status
                )))
            }
            _ => {
                return Err(ApiError::BadRequest(
                    "payment_status must be 'pending' or 'paid'".to_string(),
                ))
            }
        }
        if appointment.status == STATUS_CANCELLED {
            return Err(ApiError::BadRequest(
                "Appointment was cancelled".to_string(),
            ));
        }

        sqlx::query("UPDATE appointments SET payment_status = ?, updated_at = ? WHERE id = ?")
            .bind(payment_status)
            .bind(now_rfc3339())
            .bind(id)
            .execute(&self.db)
            .await?;

        info!(appointment_id = %id, payment_status = %payment_status, "Payment status updated");
        self.publish_current(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_expiry() {
        let now = Utc::now();
        let future = (now + Duration::minutes(5)).to_rfc3339();
        let past = (now - Duration::seconds(1)).to_rfc3339();
        assert!(!otp_expired(Some(&future), now));
        assert!(otp_expired(Some(&past), now));
        assert!(otp_expired(None, now));
        assert!(otp_expired(Some("garbage"), now));
    }
}
