//! # Applications Module
//!
//! Proposals between students and tutors. Each carries a match score from
//! the student's saved preferences; accepting one schedules a meeting.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::applications_routes;
