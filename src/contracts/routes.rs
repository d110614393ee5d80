// src/contracts/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn contracts_routes() -> Router {
    Router::new()
        .route(
            "/api/contracts",
            get(handlers::list_contracts_handler).post(handlers::propose_contract_handler),
        )
        .route("/api/contracts/:id", get(handlers::get_contract_handler))
        .route(
            "/api/contracts/:id/counter",
            post(handlers::counter_contract_handler),
        )
        .route(
            "/api/contracts/:id/accept",
            post(handlers::accept_contract_handler),
        )
        .route(
            "/api/contracts/:id/reject",
            post(handlers::reject_contract_handler),
        )
        .route(
            "/api/contracts/:id/terminate",
            post(handlers::terminate_contract_handler),
        )
}
