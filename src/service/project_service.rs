// service/project_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, projectdb::ProjectExt},
    dtos::projectdtos::CreateProjectDto,
    models::{
        projectmodel::{Project, ProjectStatus},
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

/// Legal project status transitions. Acceptance of a bid moves an open
/// project in progress; mutual completion approval finishes it; an
/// administrative or dispute override may cancel from any live state.
pub fn is_valid_transition(from: ProjectStatus, to: ProjectStatus) -> bool {
    match (from, to) {
        (ProjectStatus::Open, ProjectStatus::InProgress) => true,
        (ProjectStatus::InProgress, ProjectStatus::Completed) => true,
        (ProjectStatus::Open, ProjectStatus::Cancelled) => true,
        (ProjectStatus::InProgress, ProjectStatus::Cancelled) => true,
        (ProjectStatus::Completed, ProjectStatus::Cancelled) => true,
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct ProjectService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl ProjectService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn create_project(
        &self,
        requester: &User,
        data: CreateProjectDto,
    ) -> Result<Project, ServiceError> {
        if requester.role != UserRole::Client && requester.role != UserRole::Admin {
            return Err(ServiceError::Validation(
                "Only clients can post projects".to_string(),
            ));
        }

        let project = self
            .db_client
            .create_project(requester.id, data.title, data.description, data.budget)
            .await?;

        Ok(project)
    }

    /// Freelancer marks the assigned work as delivered. Completion still
    /// requires the client's approval.
    pub async fn submit_work(
        &self,
        project_id: Uuid,
        requester: &User,
    ) -> Result<Project, ServiceError> {
        let project = self
            .db_client
            .get_project_by_id(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        if project.assigned_freelancer_id != Some(requester.id) {
            return Err(ServiceError::NotAuthorized(requester.id, project_id));
        }

        if project.status != ProjectStatus::InProgress {
            return Err(ServiceError::BusinessRule(format!(
                "Work can only be submitted on an in-progress project (status {:?})",
                project.status
            )));
        }

        let updated = self.db_client.mark_work_submitted(project_id).await?;

        self.notification_service.notify_work_submitted(&updated).await;

        Ok(updated)
    }

    /// Client approves delivered work: in_progress -> completed, with the
    /// completion date stamped. Requires a prior work submission.
    pub async fn approve_completion(
        &self,
        project_id: Uuid,
        requester: &User,
    ) -> Result<Project, ServiceError> {
        let project = self
            .db_client
            .get_project_by_id(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        if project.client_id != requester.id {
            return Err(ServiceError::NotAuthorized(requester.id, project_id));
        }

        if !is_valid_transition(project.status, ProjectStatus::Completed) {
            return Err(ServiceError::InvalidProjectTransition {
                from: project.status,
                to: ProjectStatus::Completed,
            });
        }

        if project.work_submitted_at.is_none() {
            return Err(ServiceError::BusinessRule(
                "Completion requires the freelancer to submit the work first".to_string(),
            ));
        }

        let completed = self.db_client.complete_project(project_id).await?;

        if let Some(freelancer_id) = completed.assigned_freelancer_id {
            self.notification_service
                .notify_project_completed(freelancer_id, &completed)
                .await;
        }

        Ok(completed)
    }

    /// Administrative/dispute override: force the project to cancelled.
    pub async fn cancel_project(
        &self,
        project_id: Uuid,
        requester: &User,
    ) -> Result<Project, ServiceError> {
        if requester.role != UserRole::Admin {
            return Err(ServiceError::NotAuthorized(requester.id, project_id));
        }

        let project = self
            .db_client
            .get_project_by_id(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        if !is_valid_transition(project.status, ProjectStatus::Cancelled) {
            return Err(ServiceError::InvalidProjectTransition {
                from: project.status,
                to: ProjectStatus::Cancelled,
            });
        }

        let cancelled = self.db_client.cancel_project(project_id).await?;

        self.notification_service
            .notify_project_cancelled(cancelled.client_id, &cancelled)
            .await;
        // Cancellation clears the assignment, so notify from the pre-image.
        if let Some(freelancer_id) = project.assigned_freelancer_id {
            self.notification_service
                .notify_project_cancelled(freelancer_id, &cancelled)
                .await;
        }

        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_projects_move_in_progress_on_acceptance() {
        assert!(is_valid_transition(
            ProjectStatus::Open,
            ProjectStatus::InProgress
        ));
    }

    #[test]
    fn completion_requires_an_in_progress_project() {
        assert!(is_valid_transition(
            ProjectStatus::InProgress,
            ProjectStatus::Completed
        ));
        assert!(!is_valid_transition(
            ProjectStatus::Open,
            ProjectStatus::Completed
        ));
        assert!(!is_valid_transition(
            ProjectStatus::Cancelled,
            ProjectStatus::Completed
        ));
    }

    #[test]
    fn cancellation_is_allowed_from_any_live_state() {
        assert!(is_valid_transition(
            ProjectStatus::Open,
            ProjectStatus::Cancelled
        ));
        assert!(is_valid_transition(
            ProjectStatus::InProgress,
            ProjectStatus::Cancelled
        ));
        assert!(is_valid_transition(
            ProjectStatus::Completed,
            ProjectStatus::Cancelled
        ));
        assert!(!is_valid_transition(
            ProjectStatus::Cancelled,
            ProjectStatus::Cancelled
        ));
    }

    #[test]
    fn no_transition_leaves_a_completed_project_except_cancellation() {
        assert!(!is_valid_transition(
            ProjectStatus::Completed,
            ProjectStatus::Open
        ));
        assert!(!is_valid_transition(
            ProjectStatus::Completed,
            ProjectStatus::InProgress
        ));
    }
}

#[cfg(test)]
mod cancellation_tests {
    use sqlx::PgPool;

    use super::*;
    use crate::{
        models::bidmodel::BidDecision,
        service::test_support::{harness, seed_bid, seed_project, seed_user},
    };

    // An assignment may only exist on in_progress or completed projects,
    // so cancelling an in-progress project clears it.
    #[sqlx::test(migrations = "./migrations")]
    async fn cancellation_clears_the_freelancer_assignment(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let freelancer = seed_user(&h.db, UserRole::Freelancer, 0).await;
        let admin = seed_user(&h.db, UserRole::Admin, 0).await;
        let project = seed_project(&h.db, &client).await;
        let bid = seed_bid(&h.db, &project, &freelancer, 400).await;

        h.bids
            .decide_bid(bid.id, BidDecision::Accept, &client)
            .await
            .unwrap();

        let cancelled = h.projects.cancel_project(project.id, &admin).await.unwrap();

        assert_eq!(cancelled.status, ProjectStatus::Cancelled);
        assert_eq!(cancelled.assigned_freelancer_id, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_admins_cancel_projects(pool: PgPool) {
        let h = harness(pool);
        let client = seed_user(&h.db, UserRole::Client, 1_000).await;
        let project = seed_project(&h.db, &client).await;

        let result = h.projects.cancel_project(project.id, &client).await;
        assert!(matches!(result, Err(ServiceError::NotAuthorized(_, _))));
    }
}
