//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Email/password registration and login
//! - Anonymous guest sessions and their upgrade to full accounts
//! - JWT token generation and validation
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::Role;
pub use routes::auth_routes;
