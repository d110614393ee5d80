//! # Contracts Module
//!
//! Tuition terms negotiated after an accepted application. Parties take
//! turns: whoever made the last move waits for the other side to counter,
//! accept or reject.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::contracts_routes;
