use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct HealthRoutes;

impl HealthRoutes {
    pub fn routes() -> Router {
        Router::new().route("/", get(health_handler))
    }
}

async fn health_handler() -> Json<HealthResponse> {
    debug!("GET /health");
    Json(HealthResponse { status: "up" })
}
