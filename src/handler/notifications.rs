// handler/notifications.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    db::notificationdb::NotificationExt,
    dtos::{ApiResponse, PageQueryDto},
    error::HttpError,
    middleware::JWTAuthMiddleware,
    AppState,
};

pub fn notification_handler() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:notification_id/read", put(mark_read))
}

pub async fn list_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Query(page): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .db_client
        .get_user_notifications(auth.user.id, page.limit(), page.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success("Notifications", notifications)))
}

pub async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .db_client
        .mark_notification_read(notification_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(format!("Notification {notification_id} not found")))?;

    Ok(Json(ApiResponse::success("Notification read", notification)))
}
