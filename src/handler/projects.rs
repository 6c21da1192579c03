// handler/projects.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{biddb::BidExt, projectdb::ProjectExt},
    dtos::{biddtos::SubmitBidDto, projectdtos::CreateProjectDto, ApiResponse, PageQueryDto},
    error::HttpError,
    middleware::JWTAuthMiddleware,
    AppState,
};

pub fn project_handler() -> Router {
    Router::new()
        .route("/", post(create_project).get(list_open_projects))
        .route("/mine", get(my_projects))
        .route("/:project_id", get(get_project))
        .route("/:project_id/bids", post(submit_bid).get(get_project_bids))
        .route("/:project_id/submit-work", put(submit_work))
        .route("/:project_id/approve-completion", put(approve_completion))
        .route("/:project_id/cancel", put(cancel_project))
}

pub async fn create_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let project = app_state
        .project_service
        .create_project(&auth.user, body)
        .await?;

    Ok(Json(ApiResponse::success(
        "Project created successfully",
        project,
    )))
}

pub async fn list_open_projects(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(page): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let projects = app_state
        .db_client
        .get_open_projects(page.limit(), page.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success("Open projects", projects)))
}

pub async fn my_projects(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let projects = app_state
        .db_client
        .get_projects_by_client(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success("Your projects", projects)))
}

pub async fn get_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .db_client
        .get_project_by_id(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(format!("Project {project_id} not found")))?;

    Ok(Json(ApiResponse::success("Project details", project)))
}

pub async fn submit_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<SubmitBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bid = app_state
        .bid_service
        .submit_bid(project_id, &auth.user, body)
        .await?;

    Ok(Json(ApiResponse::success("Bid submitted successfully", bid)))
}

pub async fn get_project_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state
        .db_client
        .get_bids_for_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success("Project bids", bids)))
}

pub async fn submit_work(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .project_service
        .submit_work(project_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success(
        "Work submitted for approval",
        project,
    )))
}

pub async fn approve_completion(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .project_service
        .approve_completion(project_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success("Project completed", project)))
}

pub async fn cancel_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .project_service
        .cancel_project(project_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success("Project cancelled", project)))
}
