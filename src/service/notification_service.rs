// service/notification_service.rs
//
// Outbound notifier port. Delivery transport is external; here a
// notification is stored for later pickup and logged. Every method is
// fire-and-forget: failures are logged and swallowed so they can never
// roll back or fail the operation that triggered them.
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, notificationdb::NotificationExt},
    models::{bidmodel::Bid, paymentmodel::Payment, projectmodel::Project},
    utils::currency::format_cents,
};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        category: &str,
        message: String,
        related_id: Option<Uuid>,
    ) {
        tracing::info!(%user_id, category, "notification: {}", message);

        if let Err(err) = self
            .db_client
            .create_notification(user_id, category.to_string(), message, related_id)
            .await
        {
            tracing::warn!(%user_id, category, "failed to store notification: {}", err);
        }
    }

    pub async fn notify_bid_submitted(&self, client_id: Uuid, bid: &Bid) {
        self.notify(
            client_id,
            "bid_submitted",
            format!("New bid of {} on your project", format_cents(bid.amount)),
            Some(bid.id),
        )
        .await
    }

    pub async fn notify_bid_accepted(&self, bid: &Bid) {
        self.notify(
            bid.freelancer_id,
            "bid_accepted",
            "Your bid was accepted. The project is now in progress".to_string(),
            Some(bid.id),
        )
        .await
    }

    pub async fn notify_bid_rejected(&self, bid: &Bid) {
        self.notify(
            bid.freelancer_id,
            "bid_rejected",
            "Your bid was rejected".to_string(),
            Some(bid.id),
        )
        .await
    }

    pub async fn notify_payment_released(&self, payment: &Payment) {
        self.notify(
            payment.freelancer_id,
            "payment_released",
            format!(
                "Payment of {} released ({})",
                format_cents(payment.amount),
                payment.transaction_id
            ),
            Some(payment.id),
        )
        .await
    }

    pub async fn notify_work_submitted(&self, project: &Project) {
        self.notify(
            project.client_id,
            "work_submitted",
            format!("Work submitted for approval on \"{}\"", project.title),
            Some(project.id),
        )
        .await
    }

    pub async fn notify_project_completed(&self, freelancer_id: Uuid, project: &Project) {
        self.notify(
            freelancer_id,
            "project_completed",
            format!("Project \"{}\" was approved and completed", project.title),
            Some(project.id),
        )
        .await
    }

    pub async fn notify_project_cancelled(&self, user_id: Uuid, project: &Project) {
        self.notify(
            user_id,
            "project_cancelled",
            format!("Project \"{}\" was cancelled", project.title),
            Some(project.id),
        )
        .await
    }
}
