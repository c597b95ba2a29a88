use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{de::DeserializeOwned, Serialize};

use crate::db::DbPool;
use crate::error::{AppError, Result};

/// JSON blobs under ad hoc keys, the server-side stand-in for the admin
/// screens' browser storage.
#[derive(Clone)]
pub struct LocalStoreRepository {
    pool: DbPool,
}

impl LocalStoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let pool = self.pool.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let value = conn
                .query_row("SELECT value FROM local_store WHERE key = ?", [&key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Unparseable values read as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.get_raw(key).await?;
        Ok(raw.and_then(|value| match serde_json::from_str(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Ignoring corrupt local store entry {}: {}", key, e);
                None
            }
        }))
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let pool = self.pool.clone();
        let key = key.to_string();
        let now = Utc::now();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO local_store (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, json, now],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM local_store WHERE key = ?", [&key])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
