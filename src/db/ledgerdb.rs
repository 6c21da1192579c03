// db/ledgerdb.rs
//
// The ledger store is the only module permitted to touch accounts.balance.
// Every balance mutation happens under a FOR UPDATE row lock so that a user
// appearing on several concurrent transfers never sees a lost update.
use async_trait::async_trait;
use sqlx::{Error, Row};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    accountmodel::Account,
    paymentmodel::{Payment, PaymentStatus},
};

const PAYMENT_COLUMNS: &str = r#"
    id, project_id, bid_id, client_id, freelancer_id, amount,
    status, transaction_id, created_at, completed_at
"#;

/// Outcome of a balance mutation that may be refused for lack of funds.
#[derive(Debug)]
pub enum BalanceUpdate {
    Applied(Account),
    InsufficientFunds { available: i64 },
}

/// Outcome of the atomic escrow transfer unit.
#[derive(Debug)]
pub enum Settlement {
    Completed(Payment),
    InsufficientFunds { available: i64 },
}

#[async_trait]
pub trait LedgerExt {
    async fn create_account(&self, user_id: Uuid, starting_balance: i64)
        -> Result<Account, Error>;

    async fn get_balance(&self, user_id: Uuid) -> Result<Option<i64>, Error>;

    /// Atomically apply a signed delta to a balance, refusing any update
    /// that would leave the balance negative.
    async fn adjust_balance(&self, user_id: Uuid, delta: i64) -> Result<BalanceUpdate, Error>;

    /// Insert a standalone payment record, used for FAILED attempts that
    /// must be kept on file without any balance movement.
    async fn record_payment(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        client_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
        status: PaymentStatus,
        transaction_id: String,
    ) -> Result<Payment, Error>;

    /// The escrow settlement unit: create the payment row, move the funds
    /// from client to freelancer and flip the project to in_progress, all
    /// in one transaction. Either everything commits or nothing does; an
    /// insufficient balance rolls the whole unit back and reports the
    /// available amount so the caller can file a FAILED record instead.
    async fn execute_escrow_transfer(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        client_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
        transaction_id: String,
    ) -> Result<Settlement, Error>;

    async fn get_successful_payment(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
    ) -> Result<Option<Payment>, Error>;

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, Error>;

    async fn get_project_payments(&self, project_id: Uuid) -> Result<Vec<Payment>, Error>;
}

#[async_trait]
impl LedgerExt for DBClient {
    async fn create_account(
        &self,
        user_id: Uuid,
        starting_balance: i64,
    ) -> Result<Account, Error> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, balance)
            VALUES ($1, $2)
            RETURNING user_id, balance, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(starting_balance)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<Option<i64>, Error> {
        let row = sqlx::query("SELECT balance FROM accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<i64, _>("balance")))
    }

    async fn adjust_balance(&self, user_id: Uuid, delta: i64) -> Result<BalanceUpdate, Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT balance FROM accounts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let balance = row.get::<i64, _>("balance");
        if balance + delta < 0 {
            return Ok(BalanceUpdate::InsufficientFunds { available: balance });
        }

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, balance, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(BalanceUpdate::Applied(account))
    }

    async fn record_payment(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        client_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
        status: PaymentStatus,
        transaction_id: String,
    ) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments
            (project_id, bid_id, client_id, freelancer_id, amount, status,
             transaction_id, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    CASE WHEN $6 = 'pending'::payment_status THEN NULL ELSE NOW() END)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(bid_id)
        .bind(client_id)
        .bind(freelancer_id)
        .bind(amount)
        .bind(status)
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn execute_escrow_transfer(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        client_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
        transaction_id: String,
    ) -> Result<Settlement, Error> {
        let mut tx = self.pool.begin().await?;

        // The payment row is created pending and settled inside the same
        // unit, so no pending row can outlive the transaction.
        let pending = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments
            (project_id, bid_id, client_id, freelancer_id, amount, status, transaction_id)
            VALUES ($1, $2, $3, $4, $5, 'pending'::payment_status, $6)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(bid_id)
        .bind(client_id)
        .bind(freelancer_id)
        .bind(amount)
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        // Lock the payer first, payee second. Locks are always taken in
        // this order so concurrent settlements cannot deadlock.
        let client_row =
            sqlx::query("SELECT balance FROM accounts WHERE user_id = $1 FOR UPDATE")
                .bind(client_id)
                .fetch_one(&mut *tx)
                .await?;

        let client_balance = client_row.get::<i64, _>("balance");
        if client_balance < amount {
            // Dropping tx rolls back; no pending row or balance change survives.
            return Ok(Settlement::InsufficientFunds {
                available: client_balance,
            });
        }

        sqlx::query("SELECT balance FROM accounts WHERE user_id = $1 FOR UPDATE")
            .bind(freelancer_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance - $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(client_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(freelancer_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        // Settle: the partial unique index on (project_id, bid_id) WHERE
        // success makes the second of two concurrent settlements fail here.
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'success', completed_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(pending.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE projects
            SET status = 'in_progress', updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            "#,
        )
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Settlement::Completed(payment))
    }

    async fn get_successful_payment(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
    ) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE project_id = $1 AND bid_id = $2 AND status = 'success'
            "#
        ))
        .bind(project_id)
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE id = $1
            "#
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_project_payments(&self, project_id: Uuid) -> Result<Vec<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }
}
