// service/bid_service.rs
//
// Bid lifecycle manager. A bid is decided exactly once: the terminal
// update is guarded by `WHERE status = 'pending'` in the db layer, so of
// two concurrent deciders exactly one wins and the loser observes an
// invalid-transition error.
//
// Sibling-bid policy: accepting a bid does NOT auto-reject the project's
// other pending bids. They stay pending until the client rejects them
// explicitly; only one bid per project can ever be accepted thanks to
// the partial unique index on bids(project_id) WHERE accepted.
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{
        biddb::{BidAcceptance, BidExt},
        db::{is_unique_violation, DBClient},
        projectdb::ProjectExt,
    },
    dtos::biddtos::SubmitBidDto,
    models::{
        bidmodel::{Bid, BidDecision},
        projectmodel::ProjectStatus,
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

#[derive(Debug, Clone)]
pub struct BidService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl BidService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn submit_bid(
        &self,
        project_id: Uuid,
        requester: &User,
        data: SubmitBidDto,
    ) -> Result<Bid, ServiceError> {
        if requester.role != UserRole::Freelancer {
            return Err(ServiceError::Validation(
                "Only freelancers can bid on projects".to_string(),
            ));
        }

        if data.amount <= 0 {
            return Err(ServiceError::Validation(
                "Bid amount must be positive".to_string(),
            ));
        }

        let project = self
            .db_client
            .get_project_by_id(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        let bid = self
            .db_client
            .create_bid(project_id, requester.id, data.amount, data.proposal)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ServiceError::DuplicateBid {
                        project_id,
                        freelancer_id: requester.id,
                    }
                } else {
                    ServiceError::Database(err)
                }
            })?;

        self.notification_service
            .notify_bid_submitted(project.client_id, &bid)
            .await;

        Ok(bid)
    }

    pub async fn decide_bid(
        &self,
        bid_id: Uuid,
        decision: BidDecision,
        requester: &User,
    ) -> Result<Bid, ServiceError> {
        let bid = self
            .db_client
            .get_bid_by_id(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        let project = self
            .db_client
            .get_project_by_id(bid.project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(bid.project_id))?;

        // Only the project's client decides on its bids.
        if project.client_id != requester.id {
            return Err(ServiceError::NotAuthorized(requester.id, project.id));
        }

        if bid.status.is_terminal() {
            return Err(ServiceError::InvalidBidTransition(bid_id, bid.status));
        }

        let decided = match decision {
            BidDecision::Accept => {
                // Acceptance is the only legal way into in_progress, and
                // only from an open project.
                if project.status != ProjectStatus::Open {
                    return Err(ServiceError::InvalidProjectTransition {
                        from: project.status,
                        to: ProjectStatus::InProgress,
                    });
                }

                let outcome = self.db_client.accept_bid(bid_id).await.map_err(|err| {
                    if is_unique_violation(&err) {
                        ServiceError::BusinessRule(
                            "Project already has an accepted bid".to_string(),
                        )
                    } else {
                        ServiceError::Database(err)
                    }
                })?;

                match outcome {
                    BidAcceptance::Accepted(bid, _project) => {
                        self.notification_service.notify_bid_accepted(&bid).await;
                        bid
                    }
                    // Race losers refetch so the error carries the state
                    // that actually beat them, not the stale snapshot.
                    BidAcceptance::BidNotPending => {
                        return Err(self.bid_transition_error(bid_id).await?)
                    }
                    BidAcceptance::ProjectNotOpen => {
                        let current = self
                            .db_client
                            .get_project_by_id(project.id)
                            .await?
                            .ok_or(ServiceError::ProjectNotFound(project.id))?;

                        return Err(ServiceError::InvalidProjectTransition {
                            from: current.status,
                            to: ProjectStatus::InProgress,
                        });
                    }
                }
            }
            BidDecision::Reject => {
                let bid = match self.db_client.reject_bid(bid_id).await? {
                    Some(bid) => bid,
                    None => return Err(self.bid_transition_error(bid_id).await?),
                };

                self.notification_service.notify_bid_rejected(&bid).await;
                bid
            }
        };

        Ok(decided)
    }

    async fn bid_transition_error(&self, bid_id: Uuid) -> Result<ServiceError, ServiceError> {
        let current = self
            .db_client
            .get_bid_by_id(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        Ok(ServiceError::InvalidBidTransition(bid_id, current.status))
    }
}

#[cfg(test)]
mod decision_tests {
    use sqlx::PgPool;

    use super::*;
    use crate::{
        models::bidmodel::BidStatus,
        service::test_support::{harness, seed_bid, seed_project, seed_user},
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn acceptance_assigns_the_freelancer_and_starts_the_work(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let freelancer = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let project = seed_project(&h.db, &client).await;
        let bid = seed_bid(&h.db, &project, &freelancer, 400).await;

        let decided = h
            .bids
            .decide_bid(bid.id, BidDecision::Accept, &client)
            .await
            .unwrap();
        assert_eq!(decided.status, BidStatus::Accepted);
        assert!(decided.decided_at.is_some());

        let project = h.db.get_project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.assigned_freelancer_id, Some(freelancer.id));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn a_cancelled_project_cannot_take_an_accepted_bid(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let freelancer = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let admin = seed_user(&h.db, UserRole::Admin, 0).await;
        let project = seed_project(&h.db, &client).await;
        let bid = seed_bid(&h.db, &project, &freelancer, 400).await;

        h.projects.cancel_project(project.id, &admin).await.unwrap();

        let result = h.bids.decide_bid(bid.id, BidDecision::Accept, &client).await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidProjectTransition {
                from: ProjectStatus::Cancelled,
                to: ProjectStatus::InProgress,
            })
        ));

        // The cancelled project must stay cancelled.
        let project = h.db.get_project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Cancelled);
        assert_eq!(project.assigned_freelancer_id, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn a_decided_bid_cannot_be_decided_again(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let freelancer = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let project = seed_project(&h.db, &client).await;
        let bid = seed_bid(&h.db, &project, &freelancer, 400).await;

        h.bids
            .decide_bid(bid.id, BidDecision::Accept, &client)
            .await
            .unwrap();

        let result = h.bids.decide_bid(bid.id, BidDecision::Reject, &client).await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidBidTransition(_, BidStatus::Accepted))
        ));

        // The guarded update is the backstop when the status check raced.
        assert!(h.db.reject_bid(bid.id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn a_project_with_an_accepted_bid_takes_no_second_acceptance(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let first = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let second = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let project = seed_project(&h.db, &client).await;
        let winner = seed_bid(&h.db, &project, &first, 400).await;
        let loser = seed_bid(&h.db, &project, &second, 300).await;

        // The winner is accepted while the project row still reads open,
        // exactly what a concurrent decider observes mid-race.
        sqlx::query("UPDATE bids SET status = 'accepted', decided_at = NOW() WHERE id = $1")
            .bind(winner.id)
            .execute(&h.db.pool)
            .await
            .unwrap();

        let result = h.bids.decide_bid(loser.id, BidDecision::Accept, &client).await;
        assert!(matches!(result, Err(ServiceError::BusinessRule(_))));

        let loser = h.db.get_bid_by_id(loser.id).await.unwrap().unwrap();
        assert_eq!(loser.status, BidStatus::Pending);
    }
}
