//! # Reviews Module
//!
//! Ratings and strikes between users who have worked together, and the
//! reputation aggregate built from them.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::reviews_routes;
