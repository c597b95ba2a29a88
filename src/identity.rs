//! Identity provider glue.
//!
//! With a secret key configured, users live in a remote Clerk-style REST API.
//! Otherwise the local `members` table plays the provider's part.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::IdentityConfig;
use crate::error::{AppError, Result};
use crate::models::{CreateMember, MemberProfile, ProfileMetadata, UpdateProfile};
use crate::repositories::MemberRepository;

pub const DEFAULT_LIST_LIMIT: i64 = 100;

#[derive(Clone)]
pub enum IdentityService {
    Remote(RemoteIdentity),
    Local(MemberRepository),
}

impl IdentityService {
    pub fn from_config(config: &IdentityConfig, members: MemberRepository) -> Self {
        match &config.secret_key {
            Some(secret_key) => {
                tracing::info!("Using remote identity provider at {}", config.api_url);
                IdentityService::Remote(RemoteIdentity::new(&config.api_url, secret_key))
            }
            None => {
                tracing::info!("No identity provider key configured, using local members");
                IdentityService::Local(members)
            }
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            IdentityService::Remote(_) => "remote",
            IdentityService::Local(_) => "local",
        }
    }

    pub async fn create_user(&self, form: &CreateMember) -> Result<MemberProfile> {
        form.validate().map_err(AppError::Validation)?;
        match self {
            IdentityService::Remote(remote) => remote.create_user(form).await,
            IdentityService::Local(members) => Ok(members.create(form).await?.into()),
        }
    }

    pub async fn list_users(&self, limit: i64) -> Result<Vec<MemberProfile>> {
        let limit = if limit > 0 { limit } else { DEFAULT_LIST_LIMIT };
        match self {
            IdentityService::Remote(remote) => remote.list_users(limit).await,
            IdentityService::Local(members) => Ok(members
                .list(limit)
                .await?
                .into_iter()
                .map(MemberProfile::from)
                .collect()),
        }
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<MemberProfile>> {
        match self {
            IdentityService::Remote(remote) => remote.get_user(id).await,
            IdentityService::Local(members) => Ok(members.find_by_id(id).await?.map(Into::into)),
        }
    }

    /// Apply a partial update. Metadata is merged over what the provider
    /// already stores.
    pub async fn update_user(&self, id: &str, update: UpdateProfile) -> Result<MemberProfile> {
        let updated = match self {
            IdentityService::Remote(remote) => remote.update_user(id, update).await?,
            IdentityService::Local(members) => {
                members.update_profile(id, update).await?.map(Into::into)
            }
        };
        updated.ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }

    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<MemberProfile>> {
        match self {
            IdentityService::Remote(remote) => remote.verify_credentials(email, password).await,
            IdentityService::Local(members) => Ok(members
                .verify_credentials(email, password)
                .await?
                .map(Into::into)),
        }
    }
}

#[derive(Debug, Serialize)]
struct RemoteCreateUser<'a> {
    email_address: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    phone_number: Vec<&'a str>,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct RemoteUpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_metadata: Option<ProfileMetadata>,
}

#[derive(Debug, Deserialize)]
struct VerifyPasswordResponse {
    #[serde(default)]
    verified: bool,
}

#[derive(Clone)]
pub struct RemoteIdentity {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl RemoteIdentity {
    pub fn new(api_url: &str, secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Option<Value>> {
        let resp = request.bearer_auth(&self.secret_key).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::warn!("Identity provider returned {}: {}", status, body);
            return Err(AppError::Upstream(format!(
                "identity provider returned {status}: {body}"
            )));
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub async fn create_user(&self, form: &CreateMember) -> Result<MemberProfile> {
        let payload = RemoteCreateUser {
            email_address: vec![form.email.trim()],
            phone_number: form
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .into_iter()
                .collect(),
            password: &form.password,
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
        };
        let value = self
            .send(self.http.post(self.url("/users")).json(&payload))
            .await?
            .ok_or_else(|| AppError::Upstream("identity provider rejected user".to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list_users(&self, limit: i64) -> Result<Vec<MemberProfile>> {
        let value = self
            .send(
                self.http
                    .get(self.url("/users"))
                    .query(&[("limit", limit.to_string())]),
            )
            .await?
            .unwrap_or(Value::Array(Vec::new()));
        parse_user_list(value)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<MemberProfile>> {
        let value = self.send(self.http.get(self.url(&format!("/users/{id}")))).await?;
        value
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    pub async fn update_user(
        &self,
        id: &str,
        update: UpdateProfile,
    ) -> Result<Option<MemberProfile>> {
        let public_metadata = match update.metadata {
            Some(metadata) => {
                let Some(current) = self.get_user(id).await? else {
                    return Ok(None);
                };
                let mut merged = current.metadata;
                merged.merge(metadata);
                Some(merged)
            }
            None => None,
        };
        let payload = RemoteUpdateUser {
            first_name: update.first_name,
            last_name: update.last_name,
            image_url: update.image_url,
            public_metadata,
        };
        let value = self
            .send(
                self.http
                    .patch(self.url(&format!("/users/{id}")))
                    .json(&payload),
            )
            .await?;
        value
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<MemberProfile>> {
        let value = self
            .send(
                self.http
                    .get(self.url("/users"))
                    .query(&[("email_address", email.trim())]),
            )
            .await?
            .unwrap_or(Value::Array(Vec::new()));
        let Some(user) = parse_user_list(value)?.into_iter().next() else {
            return Ok(None);
        };

        let verified = self
            .send(
                self.http
                    .post(self.url(&format!("/users/{}/verify_password", user.id)))
                    .json(&serde_json::json!({ "password": password })),
            )
            .await;
        match verified {
            Ok(Some(value)) => {
                let response: VerifyPasswordResponse = serde_json::from_value(value)?;
                Ok(response.verified.then_some(user))
            }
            Ok(None) => Ok(None),
            // The provider answers a wrong password with a 4xx.
            Err(AppError::Upstream(msg)) => {
                tracing::debug!("Password verification rejected: {}", msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Accept both a bare array and a `{ "data": [...] }` envelope.
fn parse_user_list(value: Value) -> Result<Vec<MemberProfile>> {
    let list = match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}
