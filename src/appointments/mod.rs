//! # Appointments Module
//!
//! In-person meetings created when an application is accepted. The student
//! shows a one-time code (as digits or QR), the tutor submits it to verify
//! the meeting on site. Status changes are pushed to participants over SSE.

pub mod events;
pub mod handlers;
pub mod models;
pub mod qr;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

pub use routes::appointments_routes;
