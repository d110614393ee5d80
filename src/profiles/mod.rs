//! # Profiles Module
//!
//! Profile, presence and location management, tutor and student detail
//! records, varsity e-mail verification and student ID parsing.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod student_id;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::profiles_routes;
