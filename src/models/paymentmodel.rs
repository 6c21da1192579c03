use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

// One escrow transfer attempt for a (project, bid) pair. At most one
// row per pair may ever reach Success; the partial unique index on
// payments(project_id, bid_id) WHERE status = 'success' backs this up.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub bid_id: Uuid,
    pub client_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: i64, // in cents
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
