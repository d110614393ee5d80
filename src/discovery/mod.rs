//! # Discovery Module
//!
//! Manual tutor search: preference filters, proximity via haversine, and
//! deterministic ranking.

pub mod handlers;
pub mod matching;
pub mod models;
pub mod routes;
pub mod services;


pub use routes::discovery_routes;
