use axum::{Router, routing::get};

pub mod availability;
pub mod catalog;
pub mod inventory;
pub mod system;

/// Router for all authenticated (venue-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/catalog", catalog::router())
        .nest("/inventory", inventory::router())
        .nest("/availability", availability::router())
}
