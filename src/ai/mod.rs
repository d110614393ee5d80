//! # AI Module
//!
//! Assistant chat, LLM-ranked recommendations and free-text search, zone
//! identification from coordinates, bio writing and ID card reading.
//!
//! Ranking is best effort: provider failures or unreadable replies produce
//! an empty match list with a message rather than an error.

pub mod handlers;
pub mod models;
pub mod parsing;
pub mod prompts;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::ai_routes;
