// db/biddb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    bidmodel::Bid,
    projectmodel::Project,
};

const BID_COLUMNS: &str = r#"
    id, project_id, freelancer_id, amount, proposal, status,
    created_at, decided_at
"#;

/// Outcome of an acceptance attempt. Either guarded update can lose a
/// race after the caller's own checks passed, so both losing cases are
/// explicit outcomes rather than errors.
#[derive(Debug)]
pub enum BidAcceptance {
    Accepted(Bid, Project),
    BidNotPending,
    ProjectNotOpen,
}

#[async_trait]
pub trait BidExt {
    /// Insert a pending bid. Surfaces the UNIQUE(project_id, freelancer_id)
    /// violation untouched so the caller can map it to DuplicateBid.
    async fn create_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
        proposal: String,
    ) -> Result<Bid, Error>;

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, Error>;

    async fn get_bids_for_project(&self, project_id: Uuid) -> Result<Vec<Bid>, Error>;

    /// Accept a pending bid and assign its freelancer to the project in a
    /// single transaction. Both updates are guarded: the bid must still be
    /// pending and the project must still be open, otherwise the whole
    /// unit rolls back and the losing condition is reported.
    async fn accept_bid(&self, bid_id: Uuid) -> Result<BidAcceptance, Error>;

    /// Reject a pending bid. Returns None when the bid was not pending.
    async fn reject_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, Error>;
}

#[async_trait]
impl BidExt for DBClient {
    async fn create_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
        proposal: String,
    ) -> Result<Bid, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            INSERT INTO bids (project_id, freelancer_id, amount, proposal)
            VALUES ($1, $2, $3, $4)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(freelancer_id)
        .bind(amount)
        .bind(proposal)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE id = $1
            "#
        ))
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_bids_for_project(&self, project_id: Uuid) -> Result<Vec<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn accept_bid(&self, bid_id: Uuid) -> Result<BidAcceptance, Error> {
        let mut tx = self.pool.begin().await?;

        // Guarded terminal transition: only a pending bid can be decided,
        // so exactly one of two concurrent deciders gets a row back.
        let bid = sqlx::query_as::<_, Bid>(&format!(
            r#"
            UPDATE bids
            SET status = 'accepted', decided_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(bid_id)
        .fetch_optional(&mut *tx)
        .await?;

        let bid = match bid {
            Some(bid) => bid,
            None => return Ok(BidAcceptance::BidNotPending),
        };

        // Only an open project can take an accepted bid. Dropping tx rolls
        // the bid update back when the project moved on concurrently.
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET assigned_freelancer_id = $2,
                status = 'in_progress',
                updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING
                id, client_id, assigned_freelancer_id, title, description,
                budget, status, work_submitted_at, completion_date,
                created_at, updated_at
            "#,
        )
        .bind(bid.project_id)
        .bind(bid.freelancer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let project = match project {
            Some(project) => project,
            None => return Ok(BidAcceptance::ProjectNotOpen),
        };

        tx.commit().await?;
        Ok(BidAcceptance::Accepted(bid, project))
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            UPDATE bids
            SET status = 'rejected', decided_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await
    }
}
