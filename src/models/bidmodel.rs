use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

impl BidStatus {
    // A bid is decided exactly once: pending -> accepted | rejected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BidStatus::Accepted | BidStatus::Rejected)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BidDecision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub project_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: i64, // in cents
    pub proposal: String,
    pub status: BidStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_open_state() {
        assert!(!BidStatus::Pending.is_terminal());
        assert!(BidStatus::Accepted.is_terminal());
        assert!(BidStatus::Rejected.is_terminal());
    }
}
