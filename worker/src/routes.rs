use crate::controller::health::routes::HealthRoutes;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

pub struct Routes;

impl Routes {
    pub fn routes() -> Router {
        Router::new().nest("/health", HealthRoutes::routes()).layer(CatchPanicLayer::new())
    }
}
