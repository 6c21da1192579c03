// handler/payments.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        paymentdtos::{AdjustBalanceDto, BalanceResponseDto, PayDto},
        projectdtos::ProvisionAccountDto,
        ApiResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddleware,
    service::error::ServiceError,
    utils::currency::format_cents,
    AppState,
};

pub fn payment_handler() -> Router {
    Router::new()
        .route("/projects/:project_id/pay", post(pay))
        .route("/projects/:project_id/payments", get(get_project_payments))
        .route("/payments/:payment_id", get(get_payment))
        .route("/wallet/balance", get(get_balance))
        .route("/accounts", post(provision_account))
        .route("/accounts/:user_id/adjust", axum::routing::put(adjust_balance))
}

pub async fn pay(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<PayDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .escrow_service
        .pay(project_id, body.bid_id, body.amount, &auth.user)
        .await;

    match result {
        Ok(payment) => Ok(Json(ApiResponse::success("Payment completed", payment))),
        // Idempotent repeat: serve the original successful payment.
        Err(ServiceError::DuplicatePayment { payment }) => Ok(Json(ApiResponse::success(
            "Payment already completed",
            *payment,
        ))),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.escrow_service.get_payment(payment_id).await?;

    Ok(Json(ApiResponse::success("Payment details", payment)))
}

pub async fn get_project_payments(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state
        .escrow_service
        .get_project_payments(project_id)
        .await?;

    Ok(Json(ApiResponse::success("Project payments", payments)))
}

pub async fn get_balance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let balance = app_state.escrow_service.get_balance(auth.user.id).await?;

    Ok(Json(ApiResponse::success(
        "Account balance",
        BalanceResponseDto {
            balance,
            formatted: format_cents(balance),
        },
    )))
}

pub async fn provision_account(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<ProvisionAccountDto>,
) -> Result<impl IntoResponse, HttpError> {
    let account = app_state
        .escrow_service
        .provision_account(&auth.user, body.user_id, body.role)
        .await?;

    Ok(Json(ApiResponse::success("Account provisioned", account)))
}

pub async fn adjust_balance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AdjustBalanceDto>,
) -> Result<impl IntoResponse, HttpError> {
    let account = app_state
        .escrow_service
        .adjust_account_balance(&auth.user, user_id, body.delta)
        .await?;

    Ok(Json(ApiResponse::success("Balance adjusted", account)))
}
