use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bidmodel::BidDecision;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitBidDto {
    #[validate(range(min = 1, message = "Bid amount must be positive"))]
    pub amount: i64, // in cents

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Proposal must be between 10 and 2000 characters"
    ))]
    pub proposal: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecideBidDto {
    pub decision: BidDecision,
}
