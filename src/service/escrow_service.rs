// service/escrow_service.rs
//
// Escrow transaction coordinator. Orchestrates the pay operation:
// validate -> settle (one DB transaction) -> notify. Preconditions are
// checked in order before any mutation; the settlement itself either
// fully commits or fully rolls back. Repeated pay calls for the same
// (project, bid) pair surface the original successful payment instead of
// transferring twice.
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{
        biddb::BidExt,
        db::{is_unique_violation, DBClient},
        ledgerdb::{BalanceUpdate, LedgerExt, Settlement},
        projectdb::ProjectExt,
    },
    models::{
        accountmodel::{starting_balance_for_role, Account},
        bidmodel::{Bid, BidStatus},
        paymentmodel::{Payment, PaymentStatus},
        projectmodel::Project,
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

#[derive(Debug, Clone)]
pub struct EscrowService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl EscrowService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn pay(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        amount: i64,
        requester: &User,
    ) -> Result<Payment, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        let project = self
            .db_client
            .get_project_by_id(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        if project.client_id != requester.id {
            return Err(ServiceError::NotAuthorized(requester.id, project_id));
        }

        let bid = self
            .db_client
            .get_bid_by_id(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        check_bid_payable(&project, &bid)?;

        // Idempotency short-circuit: a prior success is returned as-is,
        // never paid again.
        if let Some(existing) = self
            .db_client
            .get_successful_payment(project_id, bid_id)
            .await?
        {
            return Err(ServiceError::DuplicatePayment {
                payment: Box::new(existing),
            });
        }

        let transaction_id = generate_transaction_id();

        let settlement = self
            .db_client
            .execute_escrow_transfer(
                project_id,
                bid_id,
                project.client_id,
                bid.freelancer_id,
                amount,
                transaction_id.clone(),
            )
            .await;

        let payment = match settlement {
            Ok(Settlement::Completed(payment)) => payment,
            Ok(Settlement::InsufficientFunds { available }) => {
                // The settlement rolled back without a trace; file a FAILED
                // record so the attempt stays auditable.
                if let Err(err) = self
                    .db_client
                    .record_payment(
                        project_id,
                        bid_id,
                        project.client_id,
                        bid.freelancer_id,
                        amount,
                        PaymentStatus::Failed,
                        transaction_id,
                    )
                    .await
                {
                    tracing::warn!(%project_id, %bid_id, "failed to record declined payment: {}", err);
                }

                return Err(ServiceError::InsufficientFunds {
                    required: amount,
                    available,
                });
            }
            Err(err) if is_unique_violation(&err) => {
                // Lost a concurrent race on the one-success-per-pair index;
                // the winner's payment is the authoritative record.
                let existing = self
                    .db_client
                    .get_successful_payment(project_id, bid_id)
                    .await?
                    .ok_or(ServiceError::Database(err))?;

                return Err(ServiceError::DuplicatePayment {
                    payment: Box::new(existing),
                });
            }
            Err(err) => return Err(ServiceError::Database(err)),
        };

        self.notification_service
            .notify_payment_released(&payment)
            .await;

        Ok(payment)
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        self.db_client
            .get_payment_by_id(payment_id)
            .await?
            .ok_or(ServiceError::PaymentNotFound(payment_id))
    }

    pub async fn get_project_payments(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.get_project_payments(project_id).await?)
    }

    pub async fn get_balance(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        self.db_client
            .get_balance(user_id)
            .await?
            .ok_or(ServiceError::AccountNotFound(user_id))
    }

    /// Registration hook: provision a platform account with the
    /// role-dependent opening balance. Admin only; registration itself
    /// lives in the external identity system.
    pub async fn provision_account(
        &self,
        requester: &User,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<Account, ServiceError> {
        if requester.role != UserRole::Admin {
            return Err(ServiceError::NotAuthorized(requester.id, user_id));
        }

        self.db_client
            .create_account(user_id, starting_balance_for_role(role))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ServiceError::Validation(format!("Account already exists for user {user_id}"))
                } else {
                    ServiceError::Database(err)
                }
            })
    }

    /// Administrative ledger correction. Deltas that would leave the
    /// balance negative are refused.
    pub async fn adjust_account_balance(
        &self,
        requester: &User,
        user_id: Uuid,
        delta: i64,
    ) -> Result<Account, ServiceError> {
        if requester.role != UserRole::Admin {
            return Err(ServiceError::NotAuthorized(requester.id, user_id));
        }

        if delta == 0 {
            return Err(ServiceError::Validation(
                "Adjustment delta cannot be zero".to_string(),
            ));
        }

        match self.db_client.adjust_balance(user_id, delta).await {
            Ok(BalanceUpdate::Applied(account)) => Ok(account),
            Ok(BalanceUpdate::InsufficientFunds { available }) => {
                Err(ServiceError::InsufficientFunds {
                    required: -delta,
                    available,
                })
            }
            Err(sqlx::Error::RowNotFound) => Err(ServiceError::AccountNotFound(user_id)),
            Err(err) => Err(ServiceError::Database(err)),
        }
    }
}

/// Payment is only ever allowed against the project's accepted bid.
fn check_bid_payable(project: &Project, bid: &Bid) -> Result<(), ServiceError> {
    if bid.project_id != project.id {
        return Err(ServiceError::BusinessRule(
            "Bid does not belong to this project".to_string(),
        ));
    }

    if bid.status != BidStatus::Accepted {
        return Err(ServiceError::BusinessRule(format!(
            "Payment is only allowed for an accepted bid (status {:?})",
            bid.status
        )));
    }

    Ok(())
}

fn generate_transaction_id() -> String {
    format!("TXN-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::projectmodel::ProjectStatus;

    fn project(id: Uuid, client_id: Uuid) -> Project {
        Project {
            id,
            client_id,
            assigned_freelancer_id: None,
            title: "Fix the roof".to_string(),
            description: "Replace broken tiles".to_string(),
            budget: 50_000,
            status: ProjectStatus::Open,
            work_submitted_at: None,
            completion_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn bid(project_id: Uuid, status: BidStatus) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            project_id,
            freelancer_id: Uuid::new_v4(),
            amount: 40_000,
            proposal: "I can do this".to_string(),
            status,
            created_at: None,
            decided_at: None,
        }
    }

    #[test]
    fn transaction_ids_are_unique_and_prefixed() {
        let a = generate_transaction_id();
        let b = generate_transaction_id();
        assert!(a.starts_with("TXN-"));
        assert_ne!(a, b);
        assert!(a.len() <= 64);
    }

    #[test]
    fn accepted_bid_on_the_same_project_is_payable() {
        let p = project(Uuid::new_v4(), Uuid::new_v4());
        let b = bid(p.id, BidStatus::Accepted);
        assert!(check_bid_payable(&p, &b).is_ok());
    }

    #[test]
    fn pending_or_rejected_bids_are_never_payable() {
        let p = project(Uuid::new_v4(), Uuid::new_v4());
        for status in [BidStatus::Pending, BidStatus::Rejected] {
            let b = bid(p.id, status);
            assert!(matches!(
                check_bid_payable(&p, &b),
                Err(ServiceError::BusinessRule(_))
            ));
        }
    }

    #[test]
    fn a_bid_from_another_project_is_rejected_before_its_status_is_considered() {
        let p = project(Uuid::new_v4(), Uuid::new_v4());
        let b = bid(Uuid::new_v4(), BidStatus::Accepted);
        assert!(matches!(
            check_bid_payable(&p, &b),
            Err(ServiceError::BusinessRule(_))
        ));
    }
}

#[cfg(test)]
mod pay_tests {
    use sqlx::PgPool;

    use super::*;
    use crate::{
        models::bidmodel::BidDecision,
        service::test_support::{harness, seed_bid, seed_project, seed_user, TestHarness},
    };

    async fn accepted_bid_setup(
        h: &TestHarness,
        client_balance: i64,
    ) -> (User, User, Project, Bid) {
        let client = seed_user(&h.db, UserRole::Client, client_balance).await;
        let freelancer = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let project = seed_project(&h.db, &client).await;
        let bid = seed_bid(&h.db, &project, &freelancer, 400).await;

        h.bids
            .decide_bid(bid.id, BidDecision::Accept, &client)
            .await
            .unwrap();

        (client, freelancer, project, bid)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn pay_moves_the_funds_and_conserves_the_total(pool: PgPool) {
        let h = harness(pool);
        let (client, freelancer, project, bid) = accepted_bid_setup(&h, 1_000).await;

        let payment = h.escrow.pay(project.id, bid.id, 400, &client).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Success);
        assert!(payment.completed_at.is_some());
        assert_eq!(h.db.get_balance(client.id).await.unwrap(), Some(600));
        assert_eq!(h.db.get_balance(freelancer.id).await.unwrap(), Some(400));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn repeat_pay_serves_the_original_payment(pool: PgPool) {
        let h = harness(pool);
        let (client, _freelancer, project, bid) = accepted_bid_setup(&h, 1_000).await;

        let first = h.escrow.pay(project.id, bid.id, 400, &client).await.unwrap();

        match h.escrow.pay(project.id, bid.id, 400, &client).await {
            Err(ServiceError::DuplicatePayment { payment }) => {
                assert_eq!(payment.id, first.id);
                assert_eq!(payment.transaction_id, first.transaction_id);
            }
            other => panic!("expected the original payment back, got {:?}", other),
        }

        // No second debit happened.
        assert_eq!(h.db.get_balance(client.id).await.unwrap(), Some(600));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn refused_pay_leaves_no_pending_row_and_no_balance_change(pool: PgPool) {
        let h = harness(pool);
        let (client, freelancer, project, bid) = accepted_bid_setup(&h, 100).await;

        let result = h.escrow.pay(project.id, bid.id, 400, &client).await;

        assert!(matches!(
            result,
            Err(ServiceError::InsufficientFunds {
                required: 400,
                available: 100,
            })
        ));
        assert_eq!(h.db.get_balance(client.id).await.unwrap(), Some(100));
        assert_eq!(h.db.get_balance(freelancer.id).await.unwrap(), Some(0));

        // The refused attempt stays on file as FAILED, nothing else.
        let payments = h.db.get_project_payments(project.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Failed);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_projects_client_can_pay(pool: PgPool) {
        let h = harness(pool);
        let (_client, _freelancer, project, bid) = accepted_bid_setup(&h, 1_000).await;
        let stranger = seed_user(&h.db, UserRole::Client, 1_000).await;

        let result = h.escrow.pay(project.id, bid.id, 400, &stranger).await;
        assert!(matches!(result, Err(ServiceError::NotAuthorized(_, _))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn an_undecided_bid_cannot_be_paid(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let freelancer = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let project = seed_project(&h.db, &client).await;
        let bid = seed_bid(&h.db, &project, &freelancer, 400).await;

        let result = h.escrow.pay(project.id, bid.id, 400, &client).await;
        assert!(matches!(result, Err(ServiceError::BusinessRule(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn account_administration_requires_an_admin(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;

        let provision = h
            .escrow
            .provision_account(&client, Uuid::new_v4(), UserRole::Freelancer)
            .await;
        assert!(matches!(provision, Err(ServiceError::NotAuthorized(_, _))));

        let adjust = h.escrow.adjust_account_balance(&client, client.id, 100).await;
        assert!(matches!(adjust, Err(ServiceError::NotAuthorized(_, _))));
    }
}
