//! In-process feed of appointment changes, fanned out to SSE subscribers.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use super::models::Appointment;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentEvent {
    pub appointment_id: String,
    pub status: String,
    pub session_status: String,
    pub payment_status: String,
    #[serde(skip)]
    pub student_id: String,
    #[serde(skip)]
    pub tutor_id: String,
}

impl AppointmentEvent {
    pub fn involves(&self, user_id: &str) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }
}

impl From<&Appointment> for AppointmentEvent {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id.clone(),
            status: appointment.status.clone(),
            session_status: appointment.session_status.clone(),
            payment_status: appointment.payment_status.clone(),
            student_id: appointment.student_id.clone(),
            tutor_id: appointment.tutor_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppointmentEvents {
    sender: broadcast::Sender<AppointmentEvent>,
}

impl Default for AppointmentEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, appointment: &Appointment) {
        // Err only means nobody is listening right now
        let delivered = self.sender.send(AppointmentEvent::from(appointment)).unwrap_or(0);
        debug!(
            appointment_id = %appointment.id,
            status = %appointment.status,
            subscribers = delivered,
            "Published appointment event"
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppointmentEvent> {
        self.sender.subscribe()
    }
}
