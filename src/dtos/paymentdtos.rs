use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PayDto {
    pub bid_id: Uuid,

    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64, // in cents
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdjustBalanceDto {
    pub delta: i64, // in cents, may be negative
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponseDto {
    pub balance: i64, // in cents
    pub formatted: String,
}
