use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::UserRole;

// Opening balances in cents, applied when the identity system
// provisions a platform account for a newly registered user.
pub const CLIENT_STARTING_BALANCE: i64 = 100_000;
pub const FREELANCER_STARTING_BALANCE: i64 = 0;

pub fn starting_balance_for_role(role: UserRole) -> i64 {
    match role {
        UserRole::Client | UserRole::Admin => CLIENT_STARTING_BALANCE,
        UserRole::Freelancer => FREELANCER_STARTING_BALANCE,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub user_id: Uuid,
    pub balance: i64, // in cents, never negative
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_start_funded_freelancers_start_empty() {
        assert!(starting_balance_for_role(UserRole::Client) > 0);
        assert_eq!(starting_balance_for_role(UserRole::Freelancer), 0);
    }
}
