pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::adaptation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Adaptation API
        .route("/api/v1/adaptations", post(handlers::handle_adapt))
        .with_state(state)
}
