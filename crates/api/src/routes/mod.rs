use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub mod health;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(handlers::generate::generate))
        .route(
            "/generate/multiview",
            post(handlers::multiview::generate_multiview),
        )
        .route("/generate/mesh", post(handlers::mesh::generate_mesh))
}
