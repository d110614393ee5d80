//! # Links Module
//!
//! Anonymous inboxes: a user shares a slug, anyone can leave a message
//! without an account, and only the owner reads the history.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::links_routes;
