//! Typed HTTP client for the `/functions/v1/*` endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cache::ProfileSource;
use crate::error::{AppError, Result};
use crate::models::{
    CreateMember, CreateSubscription, MemberDetail, MemberProfile, MemberWithStatus, Subscription,
    UpdateProfile,
};
use crate::payment::{CheckoutDetails, PaymentCallback};

/// Result of `create-subscription`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCheckout {
    pub subscription: Subscription,
    pub razorpay: CheckoutDetails,
}

#[derive(Clone)]
pub struct GymClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GymClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Sent as both `apikey` and bearer token, the way browser clients call
    /// hosted functions.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    async fn invoke<B: Serialize + ?Sized>(&self, name: &str, body: &B) -> Result<Value> {
        let mut request = self
            .http
            .post(format!("{}/functions/v1/{}", self.base_url, name))
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let value: Value = resp.json().await?;

        if value.get("success").and_then(Value::as_bool) != Some(true) {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            tracing::warn!("Function {} failed with {}: {}", name, status, message);
            return Err(AppError::Upstream(message.to_string()));
        }
        Ok(value)
    }

    pub async fn create_user(&self, form: &CreateMember) -> Result<MemberProfile> {
        let value = self.invoke("create-user", form).await?;
        field(value, "user")
    }

    pub async fn get_users(&self, limit: i64) -> Result<Vec<MemberWithStatus>> {
        let value = self.invoke("get-users", &json!({ "limit": limit })).await?;
        field(value, "users")
    }

    pub async fn get_user_detail(&self, user_id: &str) -> Result<MemberDetail> {
        let value = self
            .invoke("get-user-detail", &json!({ "userId": user_id }))
            .await?;
        field(value, "user")
    }

    /// `None` when the update carried no fields.
    pub async fn update_user_profile(
        &self,
        user_id: &str,
        update: &UpdateProfile,
    ) -> Result<Option<MemberProfile>> {
        let mut body = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut body {
            map.insert("userId".to_string(), Value::String(user_id.to_string()));
        }
        let value = self.invoke("update-user-profile", &body).await?;
        match value.get("user") {
            Some(user) => Ok(Some(serde_json::from_value(user.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn create_subscription(&self, request: &CreateSubscription) -> Result<PendingCheckout> {
        let value = self.invoke("create-subscription", request).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn verify_payment(&self, callback: &PaymentCallback) -> Result<Subscription> {
        let value = self.invoke("verify-payment", callback).await?;
        field(value, "subscription")
    }
}

impl ProfileSource for GymClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Value> {
        let value = self
            .invoke("get-user-detail", &json!({ "userId": user_id }))
            .await?;
        value
            .get("user")
            .cloned()
            .ok_or_else(|| AppError::Upstream("response has no user".to_string()))
    }
}

fn field<T: DeserializeOwned>(mut value: Value, key: &str) -> Result<T> {
    let inner = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| AppError::Upstream(format!("response has no {key}")))?;
    Ok(serde_json::from_value(inner)?)
}
