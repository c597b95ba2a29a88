use std::collections::HashSet;

use rusqlite::OptionalExtension;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, Subscription, SubscriptionStatus};

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: DbPool,
}

impl SubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, subscription: &Subscription) -> Result<()> {
        let row = subscription.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO subscriptions (id, user_id, plan_name, amount, duration, status, start_date, end_date, payment_id, gateway_order_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    row.id,
                    row.user_id,
                    row.plan_name,
                    row.amount,
                    row.duration,
                    row.status.as_str(),
                    row.start_date,
                    row.end_date,
                    row.payment_id,
                    row.gateway_order_id,
                    row.created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        self.find_one("SELECT * FROM subscriptions WHERE id = ?", id)
            .await
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Subscription>> {
        self.find_one(
            "SELECT * FROM subscriptions WHERE gateway_order_id = ?",
            order_id,
        )
        .await
    }

    /// Most recent active subscription of a user.
    pub async fn find_active_for_user(&self, user_id: &str) -> Result<Option<Subscription>> {
        self.find_one(
            "SELECT * FROM subscriptions WHERE user_id = ? AND status = 'active' ORDER BY created_at DESC LIMIT 1",
            user_id,
        )
        .await
    }

    pub async fn find_active_by_user(&self, user_id: &str) -> Result<Vec<Subscription>> {
        self.find_many(
            "SELECT * FROM subscriptions WHERE user_id = ? AND status = 'active' ORDER BY created_at DESC",
            Some(user_id.to_string()),
        )
        .await
    }

    pub async fn find_all(&self) -> Result<Vec<Subscription>> {
        self.find_many("SELECT * FROM subscriptions ORDER BY created_at DESC", None)
            .await
    }

    pub async fn active_user_ids(&self) -> Result<HashSet<String>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT DISTINCT user_id FROM subscriptions WHERE status = 'active'")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<HashSet<_>>>()?;
            Ok(ids)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Mark the subscription owning `order_id` active and record the payment.
    ///
    /// Returns `None` when no subscription carries that order id.
    pub async fn activate_by_order_id(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> Result<Option<Subscription>> {
        let pool = self.pool.clone();
        let order_id = order_id.to_string();
        let payment_id = payment_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE subscriptions SET status = ?, payment_id = ? WHERE gateway_order_id = ?",
                rusqlite::params![SubscriptionStatus::Active.as_str(), payment_id, order_id],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            let mut stmt = conn.prepare("SELECT * FROM subscriptions WHERE gateway_order_id = ?")?;
            let subscription = stmt
                .query_row([&order_id], Subscription::from_row)
                .optional()?;
            Ok(subscription)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    async fn find_one(&self, sql: &'static str, param: &str) -> Result<Option<Subscription>> {
        let pool = self.pool.clone();
        let param = param.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(sql)?;
            let result = stmt.query_row([&param], Subscription::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    async fn find_many(
        &self,
        sql: &'static str,
        param: Option<String>,
    ) -> Result<Vec<Subscription>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(sql)?;
            let rows = match param {
                Some(param) => stmt.query_map([param], Subscription::from_row)?,
                None => stmt.query_map([], Subscription::from_row)?,
            };
            let subscriptions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(subscriptions)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
