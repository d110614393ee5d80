//! URL shortener. Anyone may shorten an http(s) URL; `/s/:slug` redirects
//! and counts the visit.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::shortener_routes;
