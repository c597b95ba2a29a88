use chrono::NaiveDate;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{AttendanceRecord, AttendanceStatus, FromSqliteRow};

/// Member entry used to open an attendance sheet for a day.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub member_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: DbPool,
}

impl AttendanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add an `absent` record for every roster member without one on `date`.
    pub async fn ensure_roster(&self, date: NaiveDate, roster: Vec<RosterEntry>) -> Result<usize> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO attendance (id, member_id, name, email, date, status, check_in_time)
                 VALUES (?, ?, ?, ?, ?, 'absent', NULL)",
            )?;
            let mut inserted = 0;
            for entry in roster {
                inserted += stmt.execute(rusqlite::params![
                    Uuid::new_v4().to_string(),
                    entry.member_id,
                    entry.name,
                    entry.email,
                    date
                ])?;
            }
            Ok(inserted)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM attendance WHERE date = ? ORDER BY name ASC")?;
            let records = stmt
                .query_map([date], AttendanceRecord::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM attendance WHERE id = ?")?;
            let record = stmt.query_row([&id], AttendanceRecord::from_row).optional()?;
            Ok(record)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Flip present/absent. A present record gets `check_in_time`, an absent
    /// one loses it.
    pub async fn toggle(&self, id: &str, check_in_time: &str) -> Result<Option<AttendanceRecord>> {
        let Some(record) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let status = record.status.toggled();
        let check_in = match status {
            AttendanceStatus::Present => Some(check_in_time.to_string()),
            AttendanceStatus::Absent => None,
        };
        self.set_status(vec![id.to_string()], status, check_in.clone())
            .await?;

        Ok(Some(AttendanceRecord {
            status,
            check_in_time: check_in,
            ..record
        }))
    }

    /// Mark every listed record present. Records already present keep their
    /// original check-in time.
    pub async fn mark_present(&self, ids: Vec<String>, check_in_time: &str) -> Result<usize> {
        let pool = self.pool.clone();
        let check_in_time = check_in_time.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "UPDATE attendance SET status = 'present', check_in_time = ? WHERE id = ? AND status != 'present'",
            )?;
            let mut updated = 0;
            for id in ids {
                updated += stmt.execute(rusqlite::params![check_in_time, id])?;
            }
            Ok(updated)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    async fn set_status(
        &self,
        ids: Vec<String>,
        status: AttendanceStatus,
        check_in_time: Option<String>,
    ) -> Result<usize> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("UPDATE attendance SET status = ?, check_in_time = ? WHERE id = ?")?;
            let mut updated = 0;
            for id in ids {
                updated += stmt.execute(rusqlite::params![status.as_str(), check_in_time, id])?;
            }
            Ok(updated)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
