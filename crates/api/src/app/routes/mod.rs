use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod beneficiaries;
pub mod system;
pub mod training;
pub mod users;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/register", post(auth::register))
        .nest("/beneficiaries", beneficiaries::router())
        .nest("/training", training::router())
        .nest("/users", users::router())
}
