// handler/bids.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::put,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{biddtos::DecideBidDto, ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddleware,
    AppState,
};

pub fn bid_handler() -> Router {
    Router::new().route("/:bid_id/decision", put(decide_bid))
}

pub async fn decide_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(bid_id): Path<Uuid>,
    Json(body): Json<DecideBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state
        .bid_service
        .decide_bid(bid_id, body.decision, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success("Bid decision recorded", bid)))
}
