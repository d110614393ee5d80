// src/appointments/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const OTP_LENGTH: usize = 6;
pub const OTP_TTL_MINUTES: i64 = 15;

pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_VERIFIED: &str = "verified";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_PAID: &str = "paid";

pub const SESSION_IN_PROGRESS: &str = "in_progress";
pub const SESSION_ENDED: &str = "ended";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: String,
    pub application_id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub status: String,
    pub meeting_otp: Option<String>,
    pub otp_expires_at: Option<String>,
    pub is_verified_onsite: bool,
    pub payment_status: String,
    pub session_status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Which side of a meeting a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Student,
    Tutor,
}

impl Appointment {
    pub fn participant(&self, user_id: &str) -> Option<Participant> {
        if self.student_id == user_id {
            Some(Participant::Student)
        } else if self.tutor_id == user_id {
            Some(Participant::Tutor)
        } else {
            None
        }
    }

    /// The OTP is only ever shown to the student who presents it.
    pub fn for_viewer(mut self, user_id: &str) -> Self {
        if self.participant(user_id) != Some(Participant::Student) {
            self.meeting_otp = None;
        }
        self
    }
}

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub otp: String,
    pub expires_at: String,
    pub qr_svg: String,
}

#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub qr_svg: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_status: String,
}
