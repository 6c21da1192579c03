// service/test_support.rs
//
// Shared fixtures for the database-backed service tests. Each
// #[sqlx::test] gets its own freshly migrated scratch database, so the
// helpers seed whatever rows a scenario needs and nothing more.
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::{biddb::BidExt, db::DBClient, projectdb::ProjectExt},
    models::{
        bidmodel::Bid,
        projectmodel::Project,
        usermodel::{User, UserRole},
    },
    service::{
        bid_service::BidService, escrow_service::EscrowService,
        notification_service::NotificationService, project_service::ProjectService,
    },
};

pub struct TestHarness {
    pub db: Arc<DBClient>,
    pub bids: BidService,
    pub projects: ProjectService,
    pub escrow: EscrowService,
}

pub fn harness(pool: PgPool) -> TestHarness {
    let db = Arc::new(DBClient::new(pool));
    let notifier = Arc::new(NotificationService::new(db.clone()));

    TestHarness {
        bids: BidService::new(db.clone(), notifier.clone()),
        projects: ProjectService::new(db.clone(), notifier.clone()),
        escrow: EscrowService::new(db.clone(), notifier),
        db,
    }
}

pub async fn seed_user(db: &DBClient, role: UserRole, balance: i64) -> User {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, role)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, role, created_at
        "#,
    )
    .bind("Test User")
    .bind(format!("{}@example.com", Uuid::new_v4()))
    .bind(role)
    .fetch_one(&db.pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO accounts (user_id, balance) VALUES ($1, $2)")
        .bind(user.id)
        .bind(balance)
        .execute(&db.pool)
        .await
        .unwrap();

    user
}

pub async fn seed_project(db: &DBClient, client: &User) -> Project {
    db.create_project(
        client.id,
        "Fix the roof".to_string(),
        "Replace the broken tiles before winter".to_string(),
        50_000,
    )
    .await
    .unwrap()
}

pub async fn seed_bid(db: &DBClient, project: &Project, freelancer: &User, amount: i64) -> Bid {
    db.create_bid(
        project.id,
        freelancer.id,
        amount,
        "I can do this within a week".to_string(),
    )
    .await
    .unwrap()
}
