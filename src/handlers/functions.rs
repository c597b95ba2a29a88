//! JSON function endpoints under `/functions/v1`.
//!
//! Every endpoint answers `{ "success": true, ... }` on success and
//! `{ "success": false, "error": "..." }` with status 500 on any failure.

use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::client::PendingCheckout;
use crate::error::{AppError, Result};
use crate::identity::{IdentityService, DEFAULT_LIST_LIMIT};
use crate::models::subscription::end_date_for;
use crate::models::{
    CreateMember, CreateSubscription, MemberDetail, MemberWithStatus, Subscription,
    SubscriptionStatus, UpdateProfile,
};
use crate::payment::{PaymentCallback, PaymentGateway};
use crate::repositories::SubscriptionRepository;

#[derive(Clone)]
pub struct FunctionsState {
    pub identity: IdentityService,
    pub subscriptions: SubscriptionRepository,
    pub gateway: PaymentGateway,
}

impl FunctionsState {
    /// Users from the identity provider, each tagged `active`/`inactive`
    /// by whether they hold an active subscription.
    pub async fn list_users(&self, limit: i64) -> Result<Vec<MemberWithStatus>> {
        let users = self.identity.list_users(limit).await?;
        let active: HashSet<String> = self.subscriptions.active_user_ids().await?;

        Ok(users
            .into_iter()
            .map(|profile| {
                let subscription_status = if active.contains(&profile.id) {
                    "active"
                } else {
                    "inactive"
                };
                MemberWithStatus {
                    profile,
                    subscription_status: subscription_status.to_string(),
                }
            })
            .collect())
    }

    pub async fn user_detail(&self, user_id: &str) -> Result<MemberDetail> {
        let profile = self
            .identity
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let subscription = self.subscriptions.find_active_for_user(user_id).await?;
        Ok(MemberDetail {
            profile,
            subscription,
        })
    }

    /// Create a gateway order and the `pending` subscription it will
    /// activate once paid.
    pub async fn create_subscription(&self, request: CreateSubscription) -> Result<PendingCheckout> {
        request.validate().map_err(AppError::Validation)?;

        let id = Uuid::new_v4().to_string();
        let order = self.gateway.create_order(request.amount, &id).await?;
        let now = Utc::now();

        let subscription = Subscription {
            id,
            user_id: request.user_id.trim().to_string(),
            plan_name: request.plan_name.trim().to_string(),
            amount: request.amount,
            end_date: end_date_for(now, &request.duration),
            duration: request.duration.trim().to_string(),
            status: SubscriptionStatus::Pending,
            start_date: Some(now),
            payment_id: None,
            gateway_order_id: Some(order.id.clone()),
            created_at: now,
        };
        self.subscriptions.insert(&subscription).await?;

        tracing::info!(
            "Created pending subscription {} for {} (order {})",
            subscription.id,
            subscription.user_id,
            order.id
        );
        Ok(PendingCheckout {
            subscription,
            razorpay: self.gateway.checkout(order),
        })
    }

    /// Check the gateway signature and activate the matching subscription.
    /// Nothing is written unless the signature verifies.
    pub async fn verify_payment(&self, callback: &PaymentCallback) -> Result<Subscription> {
        let fields = callback.fields()?;
        self.gateway.verify(fields)?;

        let activated = self
            .subscriptions
            .activate_by_order_id(fields.order_id, fields.payment_id)
            .await
            .map_err(|e| {
                tracing::error!("Error updating subscription: {}", e);
                AppError::Internal("Failed to update subscription status".to_string())
            })?;

        match activated {
            Some(subscription) => {
                tracing::info!(
                    "Payment {} verified for order {}",
                    fields.payment_id,
                    fields.order_id
                );
                Ok(subscription)
            }
            None => {
                tracing::error!("No subscription for order {}", fields.order_id);
                Err(AppError::Internal(
                    "Failed to update subscription status".to_string(),
                ))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GetUsersRequest {
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct UserIdRequest {
    #[serde(default, rename = "userId", alias = "user_id")]
    user_id: Option<String>,
}

impl UserIdRequest {
    fn require(self) -> Result<String> {
        self.user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Validation("User ID is required".to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct UpdateUserProfileRequest {
    #[serde(default, rename = "userId", alias = "user_id")]
    user_id: Option<String>,
    #[serde(flatten)]
    update: UpdateProfile,
}

/// An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn success(status: StatusCode, mut body: Value) -> Response {
    if let Value::Object(map) = &mut body {
        map.insert("success".to_string(), Value::Bool(true));
    }
    (status, Json(body)).into_response()
}

fn failure(function: &str, err: AppError) -> Response {
    tracing::error!("Function {} failed: {}", function, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": err.public_message() })),
    )
        .into_response()
}

fn respond(function: &str, status: StatusCode, result: Result<Value>) -> Response {
    match result {
        Ok(body) => success(status, body),
        Err(err) => failure(function, err),
    }
}

async fn run_create_user(state: &FunctionsState, body: &Bytes) -> Result<Value> {
    let form: CreateMember = parse_body(body)?;
    tracing::info!("Creating user with email {}", form.email.trim());
    let user = state.identity.create_user(&form).await?;
    Ok(json!({ "user": user, "message": "User created successfully" }))
}

async fn run_get_users(state: &FunctionsState, body: &Bytes) -> Result<Value> {
    let request: GetUsersRequest = parse_body(body).unwrap_or_default();
    let users = state
        .list_users(request.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    tracing::debug!("Returning {} users", users.len());
    Ok(json!({ "users": users }))
}

async fn run_get_user_detail(state: &FunctionsState, body: &Bytes) -> Result<Value> {
    let user_id = parse_body::<UserIdRequest>(body)
        .unwrap_or_default()
        .require()?;
    let user = state.user_detail(&user_id).await?;
    Ok(json!({ "user": user }))
}

async fn run_update_user_profile(state: &FunctionsState, body: &Bytes) -> Result<Value> {
    let request: UpdateUserProfileRequest = parse_body(body).unwrap_or_default();
    let user_id = UserIdRequest {
        user_id: request.user_id,
    }
    .require()?;

    if request.update.is_empty() {
        return Ok(json!({ "message": "No updates provided" }));
    }
    let user = state.identity.update_user(&user_id, request.update).await?;
    tracing::info!("Updated profile for {}", user_id);
    Ok(json!({ "user": user }))
}

async fn run_create_subscription(state: &FunctionsState, body: &Bytes) -> Result<Value> {
    let request: CreateSubscription = parse_body(body)?;
    let checkout = state.create_subscription(request).await?;
    Ok(serde_json::to_value(checkout)?)
}

async fn run_verify_payment(state: &FunctionsState, body: &Bytes) -> Result<Value> {
    let callback: PaymentCallback = parse_body(body)?;
    let subscription = state.verify_payment(&callback).await?;
    Ok(json!({
        "message": "Payment verified successfully",
        "subscription": subscription,
    }))
}

pub async fn create_user(State(state): State<FunctionsState>, body: Bytes) -> Response {
    let result = run_create_user(&state, &body).await;
    respond("create-user", StatusCode::CREATED, result)
}

pub async fn get_users(State(state): State<FunctionsState>, body: Bytes) -> Response {
    let result = run_get_users(&state, &body).await;
    respond("get-users", StatusCode::OK, result)
}

pub async fn get_user_detail(State(state): State<FunctionsState>, body: Bytes) -> Response {
    let result = run_get_user_detail(&state, &body).await;
    respond("get-user-detail", StatusCode::OK, result)
}

pub async fn update_user_profile(State(state): State<FunctionsState>, body: Bytes) -> Response {
    let result = run_update_user_profile(&state, &body).await;
    respond("update-user-profile", StatusCode::OK, result)
}

pub async fn create_subscription(State(state): State<FunctionsState>, body: Bytes) -> Response {
    let result = run_create_subscription(&state, &body).await;
    respond("create-subscription", StatusCode::OK, result)
}

pub async fn verify_payment(State(state): State<FunctionsState>, body: Bytes) -> Response {
    let result = run_verify_payment(&state, &body).await;
    respond("verify-payment", StatusCode::OK, result)
}
