//! Aggregate marketplace numbers behind the presentation pages.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

pub use routes::pitch_routes;
