use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::admin_user_repo::{hash_password, verify_password};
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{CreateMember, FromSqliteRow, Member, ProfileMetadata, UpdateProfile};

/// Local identity records, used when no remote identity provider is
/// configured.
#[derive(Clone)]
pub struct MemberRepository {
    pool: DbPool,
}

impl MemberRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, form: &CreateMember) -> Result<Member> {
        let email = form.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Validation(
                "A user with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let member = Member {
            id: format!("user_{}", Uuid::new_v4().simple()),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email,
            phone: form
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            password_hash: hash_password(&form.password)?,
            image_url: None,
            metadata: ProfileMetadata::default(),
            created_at: now,
            updated_at: now,
        };
        let row = member.clone();
        let metadata = serde_json::to_string(&row.metadata)?;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO members (id, first_name, last_name, email, phone, password_hash, image_url, metadata, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    row.id,
                    row.first_name,
                    row.last_name,
                    row.email,
                    row.phone,
                    row.password_hash,
                    row.image_url,
                    metadata,
                    row.created_at,
                    row.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(member)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Member>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM members WHERE id = ?")?;
            let result = stmt.query_row([&id], Member::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        let pool = self.pool.clone();
        let email = email.trim().to_lowercase();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM members WHERE email = ?")?;
            let result = stmt.query_row([&email], Member::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Newest first.
    pub async fn list(&self, limit: i64) -> Result<Vec<Member>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM members ORDER BY created_at DESC LIMIT ?")?;
            let members = stmt
                .query_map([limit], Member::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(members)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn count(&self) -> Result<i64> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Apply the provided fields; metadata is merged over the stored blob.
    pub async fn update_profile(&self, id: &str, update: UpdateProfile) -> Result<Option<Member>> {
        let Some(mut member) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(first_name) = update.first_name {
            member.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = update.last_name {
            member.last_name = last_name.trim().to_string();
        }
        if let Some(image_url) = update.image_url {
            member.image_url = Some(image_url).filter(|url| !url.is_empty());
        }
        if let Some(metadata) = update.metadata {
            member.metadata.merge(metadata);
        }
        member.updated_at = Utc::now();

        let row = member.clone();
        let metadata = serde_json::to_string(&row.metadata)?;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE members SET first_name = ?, last_name = ?, image_url = ?, metadata = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![
                    row.first_name,
                    row.last_name,
                    row.image_url,
                    metadata,
                    row.updated_at,
                    row.id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(Some(member))
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<Member>> {
        match self.find_by_email(email).await? {
            Some(member) if verify_password(password, &member.password_hash)? => Ok(Some(member)),
            _ => Ok(None),
        }
    }
}
