// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        bids::bid_handler, notifications::notification_handler, payments::payment_handler,
        projects::project_handler,
    },
    middleware::auth,
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .route("/healthcheck", get(health_check))
        .nest(
            "/projects",
            project_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/bids", bid_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/notifications",
            notification_handler().layer(middleware::from_fn(auth)),
        )
        // Escrow/ledger routes carry their own prefixes (projects/:id/pay,
        // payments/:id, wallet/balance, accounts).
        .merge(payment_handler().layer(middleware::from_fn(auth)))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new().nest("/api", api_route)
}
