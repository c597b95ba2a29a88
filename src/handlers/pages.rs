use std::str::FromStr;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::functions::FunctionsState;
use super::render;
use crate::catalog::{self, Workout};
use crate::error::{AppError, Result};
use crate::middleware::{MemberUser, OptionalMember};
use crate::models::member::bmi_category;
use crate::models::subscription::{Plan, PLANS};
use crate::models::{CreateSubscription, MemberProfile, ProfileMetadata, Subscription, UpdateProfile};
use crate::payment::PaymentCallback;

#[derive(Clone)]
pub struct PagesState {
    pub functions: FunctionsState,
}

/// A subscription as the member pages display it.
pub struct SubscriptionView {
    pub id: String,
    pub plan_name: String,
    pub amount: i64,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub days_remaining: i64,
    pub progress: u8,
}

impl SubscriptionView {
    pub fn new(subscription: &Subscription, now: DateTime<Utc>) -> Self {
        let fmt = |d: Option<DateTime<Utc>>| {
            d.map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        Self {
            id: subscription.id.clone(),
            plan_name: subscription.plan_name.clone(),
            amount: subscription.amount,
            status: subscription.status.as_str().to_string(),
            start_date: fmt(subscription.start_date),
            end_date: fmt(subscription.end_date),
            days_remaining: subscription.days_remaining(now),
            progress: subscription.progress_percentage(now),
        }
    }
}

/// Body metrics with the derived BMI.
pub struct MetricsView {
    pub height: String,
    pub weight: String,
    pub age: String,
    pub bmi: Option<String>,
    pub category: Option<&'static str>,
}

impl MetricsView {
    pub fn new(metadata: &ProfileMetadata) -> Self {
        let bmi = metadata.bmi();
        Self {
            height: metadata.height.map(|h| h.to_string()).unwrap_or_default(),
            weight: metadata.weight.map(|w| w.to_string()).unwrap_or_default(),
            age: metadata.age.map(|a| a.to_string()).unwrap_or_default(),
            bmi: bmi.map(|b| format!("{b:.1}")),
            category: bmi.map(bmi_category),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate {
    signed_in: bool,
    plans: &'static [Plan],
    workouts: &'static [Workout],
}

#[derive(Template)]
#[template(path = "pages/about.html")]
struct AboutTemplate {
    signed_in: bool,
}

#[derive(Template)]
#[template(path = "pages/plans.html")]
struct PlansTemplate {
    signed_in: bool,
    plans: &'static [Plan],
}

#[derive(Template)]
#[template(path = "workouts/list.html")]
struct WorkoutsTemplate {
    signed_in: bool,
    workouts: &'static [Workout],
}

#[derive(Template)]
#[template(path = "workouts/show.html")]
struct WorkoutDetailTemplate {
    signed_in: bool,
    workout: &'static Workout,
}

#[derive(Template)]
#[template(path = "pages/profile.html")]
struct ProfileTemplate {
    signed_in: bool,
    profile: MemberProfile,
    metrics: MetricsView,
    subscriptions: Vec<SubscriptionView>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/bmi.html")]
struct BmiTemplate {
    signed_in: bool,
    metrics: MetricsView,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/subscriptions.html")]
struct SubscriptionsTemplate {
    signed_in: bool,
    plans: &'static [Plan],
    subscriptions: Vec<SubscriptionView>,
}

#[derive(Template)]
#[template(path = "pages/checkout.html")]
struct CheckoutTemplate {
    signed_in: bool,
    plan: &'static Plan,
    subscription_id: String,
    order_id: String,
    key_id: String,
    amount_minor: i64,
    currency: String,
    member_name: String,
    member_email: String,
    offline: bool,
    simulated_payment_id: String,
    simulated_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub image_url: String,
}

/// Metric inputs arrive as strings; blanks mean "leave unchanged".
#[derive(Debug, Default, Deserialize)]
pub struct MetricsForm {
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
}

impl MetricsForm {
    pub fn parse(&self) -> Result<ProfileMetadata> {
        let height: Option<f64> = parse_optional(self.height.as_deref(), "Height")?;
        let weight: Option<f64> = parse_optional(self.weight.as_deref(), "Weight")?;
        let age: Option<u32> = parse_optional(self.age.as_deref(), "Age")?;
        let invalid = |v: f64| !v.is_finite() || v <= 0.0;
        if height.is_some_and(invalid) || weight.is_some_and(invalid) {
            return Err(AppError::Validation(
                "Height and weight must be positive".to_string(),
            ));
        }
        Ok(ProfileMetadata {
            height,
            weight,
            age,
            ..Default::default()
        })
    }
}

fn parse_optional<T: FromStr>(value: Option<&str>, field: &str) -> Result<Option<T>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{field} must be a number"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub plan: String,
}

pub async fn home(OptionalMember(member): OptionalMember) -> Result<Response> {
    let template = HomeTemplate {
        signed_in: member.is_some(),
        plans: PLANS,
        workouts: catalog::all(),
    };
    Ok(render(&template)?.into_response())
}

pub async fn about_us(OptionalMember(member): OptionalMember) -> Result<Response> {
    let template = AboutTemplate {
        signed_in: member.is_some(),
    };
    Ok(render(&template)?.into_response())
}

pub async fn plans(OptionalMember(member): OptionalMember) -> Result<Response> {
    let template = PlansTemplate {
        signed_in: member.is_some(),
        plans: PLANS,
    };
    Ok(render(&template)?.into_response())
}

pub async fn workouts(_member: MemberUser) -> Result<Response> {
    let template = WorkoutsTemplate {
        signed_in: true,
        workouts: catalog::all(),
    };
    Ok(render(&template)?.into_response())
}

pub async fn workout_detail(_member: MemberUser, Path(id): Path<String>) -> Result<Response> {
    let workout = id
        .parse()
        .ok()
        .and_then(catalog::find)
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))?;
    let template = WorkoutDetailTemplate {
        signed_in: true,
        workout,
    };
    Ok(render(&template)?.into_response())
}

async fn profile_page(
    state: &PagesState,
    member: &MemberUser,
    error: Option<String>,
) -> Result<Response> {
    let detail = state.functions.user_detail(&member.id).await?;
    let now = Utc::now();
    let subscriptions = state
        .functions
        .subscriptions
        .find_active_by_user(&member.id)
        .await?
        .iter()
        .map(|s| SubscriptionView::new(s, now))
        .collect();

    let template = ProfileTemplate {
        signed_in: true,
        metrics: MetricsView::new(&detail.profile.metadata),
        profile: detail.profile,
        subscriptions,
        error,
    };
    Ok(render(&template)?.into_response())
}

pub async fn profile(State(state): State<PagesState>, member: MemberUser) -> Result<Response> {
    profile_page(&state, &member, None).await
}

pub async fn update_profile(
    State(state): State<PagesState>,
    member: MemberUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let non_empty = |s: String| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    let update = UpdateProfile {
        first_name: non_empty(form.first_name),
        last_name: non_empty(form.last_name),
        image_url: non_empty(form.image_url),
        metadata: None,
    };
    if !update.is_empty() {
        state
            .functions
            .identity
            .update_user(&member.id, update)
            .await?;
    }
    Ok(Redirect::to("/profile").into_response())
}

pub async fn update_metrics(
    State(state): State<PagesState>,
    member: MemberUser,
    Form(form): Form<MetricsForm>,
) -> Result<Response> {
    let metadata = match form.parse() {
        Ok(metadata) => metadata,
        Err(AppError::Validation(message)) => {
            return profile_page(&state, &member, Some(message)).await
        }
        Err(e) => return Err(e),
    };
    let update = UpdateProfile {
        metadata: Some(metadata),
        ..Default::default()
    };
    state
        .functions
        .identity
        .update_user(&member.id, update)
        .await?;
    tracing::debug!("Updated metrics for {}", member.id);
    Ok(Redirect::to("/profile").into_response())
}

pub async fn bmi(
    State(state): State<PagesState>,
    member: MemberUser,
    Query(query): Query<MetricsForm>,
) -> Result<Response> {
    let profile = state
        .functions
        .identity
        .get_user(&member.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (metadata, error) = match query.parse() {
        Ok(entered) => {
            let mut metadata = profile.metadata;
            metadata.merge(entered);
            (metadata, None)
        }
        Err(AppError::Validation(message)) => (profile.metadata, Some(message)),
        Err(e) => return Err(e),
    };

    let template = BmiTemplate {
        signed_in: true,
        metrics: MetricsView::new(&metadata),
        error,
    };
    Ok(render(&template)?.into_response())
}

pub async fn subscriptions(State(state): State<PagesState>, member: MemberUser) -> Result<Response> {
    let now = Utc::now();
    let subscriptions = state
        .functions
        .subscriptions
        .find_active_by_user(&member.id)
        .await?
        .iter()
        .map(|s| SubscriptionView::new(s, now))
        .collect();

    let template = SubscriptionsTemplate {
        signed_in: true,
        plans: PLANS,
        subscriptions,
    };
    Ok(render(&template)?.into_response())
}

pub async fn checkout(
    State(state): State<PagesState>,
    member: MemberUser,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let plan = PLANS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(form.plan.trim()))
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", form.plan)))?;
    let profile = state
        .functions
        .identity
        .get_user(&member.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let pending = state
        .functions
        .create_subscription(CreateSubscription {
            user_id: member.id.clone(),
            plan_name: plan.name.to_string(),
            amount: plan.price,
            duration: plan.duration.to_string(),
        })
        .await?;

    let gateway = &state.functions.gateway;
    let offline = gateway.is_offline();
    let (simulated_payment_id, simulated_signature) = if offline {
        let payment_id = format!("pay_{}", uuid::Uuid::new_v4().simple());
        let signature = gateway.sign(&pending.razorpay.order_id, &payment_id);
        (payment_id, signature)
    } else {
        (String::new(), String::new())
    };

    let template = CheckoutTemplate {
        signed_in: true,
        plan,
        subscription_id: pending.subscription.id,
        order_id: pending.razorpay.order_id,
        key_id: pending.razorpay.key_id,
        amount_minor: pending.razorpay.amount,
        currency: pending.razorpay.currency,
        member_name: profile.full_name(),
        member_email: profile.primary_email().to_string(),
        offline,
        simulated_payment_id,
        simulated_signature,
    };
    Ok(render(&template)?.into_response())
}

pub async fn confirm_payment(
    State(state): State<PagesState>,
    member: MemberUser,
    Form(callback): Form<PaymentCallback>,
) -> Result<Response> {
    if let Some(order_id) = callback.razorpay_order_id.as_deref() {
        let owner = state
            .functions
            .subscriptions
            .find_by_order_id(order_id)
            .await?
            .map(|s| s.user_id);
        if owner.is_some_and(|owner| owner != member.id) {
            return Err(AppError::Forbidden(
                "This order belongs to another member".to_string(),
            ));
        }
    }

    state.functions.verify_payment(&callback).await?;
    Ok(Redirect::to("/profile").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionStatus;
    use chrono::Duration;

    #[test]
    fn test_metrics_form_blank_fields_are_none() {
        let form = MetricsForm {
            height: Some("180".to_string()),
            weight: Some(" ".to_string()),
            age: None,
        };
        let metadata = form.parse().unwrap();
        assert_eq!(metadata.height, Some(180.0));
        assert_eq!(metadata.weight, None);
    }

    #[test]
    fn test_metrics_form_rejects_bad_numbers() {
        let form = MetricsForm {
            age: Some("old".to_string()),
            ..Default::default()
        };
        assert_eq!(form.parse().unwrap_err().public_message(), "Age must be a number");

        let form = MetricsForm {
            height: Some("-5".to_string()),
            ..Default::default()
        };
        assert!(form.parse().is_err());
    }

    #[test]
    fn test_metrics_form_rejects_non_finite() {
        for value in ["NaN", "inf", "-inf"] {
            let form = MetricsForm {
                weight: Some(value.to_string()),
                ..Default::default()
            };
            assert_eq!(
                form.parse().unwrap_err().public_message(),
                "Height and weight must be positive"
            );
        }
    }

    #[test]
    fn test_metrics_view_formats_bmi() {
        let view = MetricsView::new(&ProfileMetadata {
            height: Some(175.0),
            weight: Some(70.0),
            ..Default::default()
        });
        assert_eq!(view.bmi.as_deref(), Some("22.9"));
        assert_eq!(view.category, Some("Normal weight"));
        assert_eq!(view.age, "");
    }

    #[test]
    fn test_subscription_view() {
        let now = Utc::now();
        let subscription = Subscription {
            id: "sub_1".to_string(),
            user_id: "user_1".to_string(),
            plan_name: "Basic".to_string(),
            amount: 999,
            duration: "month".to_string(),
            status: SubscriptionStatus::Active,
            start_date: Some(now - Duration::days(10)),
            end_date: Some(now + Duration::days(10)),
            payment_id: Some("pay_1".to_string()),
            gateway_order_id: Some("order_1".to_string()),
            created_at: now,
        };
        let view = SubscriptionView::new(&subscription, now);
        assert_eq!(view.days_remaining, 10);
        assert_eq!(view.progress, 50);
        assert_eq!(view.status, "active");
    }
}
