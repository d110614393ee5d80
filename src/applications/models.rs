// src/applications/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::appointments::models::Appointment;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_REJECTED: &str = "rejected";

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
    pub match_score: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub receiver_id: String,
    pub message: String,
}

/// Which side of the inbox to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    #[default]
    Received,
    Sent,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationsQuery {
    #[serde(rename = "box", default)]
    pub mailbox: Mailbox,
}

#[derive(Debug, Serialize)]
pub struct ApplicationDecision {
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<Appointment>,
}
