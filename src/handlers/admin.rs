use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;

use super::functions::FunctionsState;
use super::pages::{MetricsView, SubscriptionView};
use super::render;
use crate::admin_store::AdminStore;
use crate::error::{AppError, Result};
use crate::identity::DEFAULT_LIST_LIMIT;
use crate::middleware::AdminUser;
use crate::models::admin_workout::{WORKOUT_CATEGORIES, WORKOUT_DIFFICULTIES};
use crate::models::{
    AdminWorkout, AttendanceRecord, GymSettings, MemberProfile, MemberWithStatus, SettingsForm,
    SubscriptionSummary, SubscriptionWithMember, WorkoutForm,
};
use crate::repositories::{
    AdminUserRepository, AttendanceRepository, RosterEntry, SessionRepository, SessionScope,
};
use crate::search::filter_by_query;
use crate::session::get_session_token;

#[derive(Clone)]
pub struct AdminState {
    pub functions: FunctionsState,
    pub attendance: AttendanceRepository,
    pub store: AdminStore,
    pub admin_repo: AdminUserRepository,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

impl SearchQuery {
    fn text(&self) -> String {
        self.q.as_deref().unwrap_or("").to_string()
    }
}

/// Member row on the users and dashboard screens.
pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub image_url: String,
    pub status: String,
    pub joined: String,
}

impl From<&MemberWithStatus> for MemberRow {
    fn from(user: &MemberWithStatus) -> Self {
        let profile = &user.profile;
        Self {
            id: profile.id.clone(),
            name: profile.full_name(),
            email: profile.primary_email().to_string(),
            phone: profile
                .phone_numbers
                .first()
                .map(|p| p.phone_number.clone())
                .unwrap_or_default(),
            image_url: profile.image_url.clone(),
            status: user.subscription_status.clone(),
            joined: profile
                .created_at
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub struct SubscriptionRow {
    pub view: SubscriptionView,
    pub member_name: String,
    pub member_email: String,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    admin: AdminUser,
    member_count: usize,
    summary: SubscriptionSummary,
    workout_count: usize,
    present_today: usize,
    recent_members: Vec<MemberRow>,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    admin: AdminUser,
    query: String,
    total: usize,
    users: Vec<MemberRow>,
}

#[derive(Template)]
#[template(path = "admin/user_detail.html")]
struct UserDetailTemplate {
    admin: AdminUser,
    profile: MemberProfile,
    phone: String,
    metrics: MetricsView,
    subscription: Option<SubscriptionView>,
}

#[derive(Template)]
#[template(path = "admin/subscriptions.html")]
struct SubscriptionsTemplate {
    admin: AdminUser,
    query: String,
    summary: SubscriptionSummary,
    subscriptions: Vec<SubscriptionRow>,
}

#[derive(Template)]
#[template(path = "admin/attendance.html")]
struct AttendanceTemplate {
    admin: AdminUser,
    query: String,
    date: String,
    records: Vec<AttendanceRecord>,
    present: usize,
    absent: usize,
}

#[derive(Template)]
#[template(path = "admin/workouts.html")]
struct WorkoutsTemplate {
    admin: AdminUser,
    query: String,
    workouts: Vec<AdminWorkout>,
    form: WorkoutForm,
    categories: &'static [&'static str],
    difficulties: &'static [&'static str],
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/workout_edit.html")]
struct WorkoutEditTemplate {
    admin: AdminUser,
    workout_id: String,
    form: WorkoutForm,
    categories: &'static [&'static str],
    difficulties: &'static [&'static str],
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/settings.html")]
struct SettingsTemplate {
    admin: AdminUser,
    settings: GymSettings,
    message: Option<String>,
    error: Option<String>,
}

pub async fn dashboard(State(state): State<AdminState>, admin: AdminUser) -> Result<Response> {
    let users = state.functions.list_users(DEFAULT_LIST_LIMIT).await?;
    let subscriptions = state.functions.subscriptions.find_all().await?;
    let summary = SubscriptionSummary::from_subscriptions(&subscriptions, Utc::now());
    let workout_count = state.store.list_workouts().await?.len();
    let present_today = state
        .attendance
        .find_by_date(Local::now().date_naive())
        .await?
        .iter()
        .filter(|r| r.is_present())
        .count();

    let mut recent: Vec<&MemberWithStatus> = users.iter().collect();
    recent.sort_by(|a, b| b.profile.created_at.cmp(&a.profile.created_at));

    let template = DashboardTemplate {
        admin,
        member_count: users.len(),
        summary,
        workout_count,
        present_today,
        recent_members: recent.into_iter().take(5).map(MemberRow::from).collect(),
    };
    Ok(render(&template)?.into_response())
}

pub async fn users(
    State(state): State<AdminState>,
    admin: AdminUser,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let q = query.text();
    let all = state.functions.list_users(DEFAULT_LIST_LIMIT).await?;
    let total = all.len();
    let users = filter_by_query(all, &q)
        .iter()
        .map(MemberRow::from)
        .collect();

    let template = UsersTemplate {
        admin,
        query: q,
        total,
        users,
    };
    Ok(render(&template)?.into_response())
}

pub async fn user_detail(
    State(state): State<AdminState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let detail = state.functions.user_detail(&id).await?;
    let now = Utc::now();

    let template = UserDetailTemplate {
        admin,
        phone: detail
            .profile
            .phone_numbers
            .first()
            .map(|p| p.phone_number.clone())
            .unwrap_or_default(),
        metrics: MetricsView::new(&detail.profile.metadata),
        subscription: detail
            .subscription
            .as_ref()
            .map(|s| SubscriptionView::new(s, now)),
        profile: detail.profile,
    };
    Ok(render(&template)?.into_response())
}

pub async fn subscriptions(
    State(state): State<AdminState>,
    admin: AdminUser,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let q = query.text();
    let now = Utc::now();
    let subscriptions = state.functions.subscriptions.find_all().await?;
    let summary = SubscriptionSummary::from_subscriptions(&subscriptions, now);

    let members: HashMap<String, MemberProfile> = state
        .functions
        .identity
        .list_users(DEFAULT_LIST_LIMIT)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let with_members: Vec<SubscriptionWithMember> = subscriptions
        .into_iter()
        .map(|subscription| SubscriptionWithMember {
            user: members.get(&subscription.user_id).cloned(),
            subscription,
        })
        .collect();

    let rows = filter_by_query(with_members, &q)
        .into_iter()
        .map(|s| SubscriptionRow {
            view: SubscriptionView::new(&s.subscription, now),
            member_name: s
                .user
                .as_ref()
                .map(MemberProfile::full_name)
                .unwrap_or_else(|| s.subscription.user_id.clone()),
            member_email: s
                .user
                .as_ref()
                .map(|u| u.primary_email().to_string())
                .unwrap_or_default(),
        })
        .collect();

    let template = SubscriptionsTemplate {
        admin,
        query: q,
        summary,
        subscriptions: rows,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl AttendanceQuery {
    fn date(&self) -> NaiveDate {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn text(&self) -> String {
        self.q.as_deref().unwrap_or("").to_string()
    }

    /// Attendance page URL preserving this date and search.
    fn url(&self) -> Result<String> {
        let mut url = reqwest::Url::parse("http://localhost/admin/attendance")
            .map_err(|e| AppError::Internal(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("date", &self.date().format("%Y-%m-%d").to_string())
            .append_pair("q", &self.text());
        Ok(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
    }
}

fn check_in_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Records for the day, after making sure every member has one.
async fn attendance_for(state: &AdminState, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
    let roster = state
        .functions
        .identity
        .list_users(DEFAULT_LIST_LIMIT)
        .await?
        .into_iter()
        .map(|p| RosterEntry {
            name: p.full_name(),
            email: p.primary_email().to_string(),
            member_id: p.id,
        })
        .collect();
    let added = state.attendance.ensure_roster(date, roster).await?;
    if added > 0 {
        tracing::debug!("Opened {} attendance records for {}", added, date);
    }
    state.attendance.find_by_date(date).await
}

pub async fn attendance(
    State(state): State<AdminState>,
    admin: AdminUser,
    Query(query): Query<AttendanceQuery>,
) -> Result<Response> {
    let date = query.date();
    let q = query.text();
    let records = filter_by_query(attendance_for(&state, date).await?, &q);
    let present = records.iter().filter(|r| r.is_present()).count();

    let template = AttendanceTemplate {
        admin,
        query: q,
        date: date.format("%Y-%m-%d").to_string(),
        absent: records.len() - present,
        present,
        records,
    };
    Ok(render(&template)?.into_response())
}

pub async fn toggle_attendance(
    State(state): State<AdminState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Form(query): Form<AttendanceQuery>,
) -> Result<Response> {
    let record = state
        .attendance
        .toggle(&id, &check_in_time())
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".to_string()))?;
    tracing::info!(
        "Marked {} {} on {}",
        record.name,
        record.status.as_str(),
        record.date
    );
    Ok(Redirect::to(&query.url()?).into_response())
}

/// Mark everyone in the current (filtered) view present.
pub async fn mark_all_present(
    State(state): State<AdminState>,
    _admin: AdminUser,
    Form(query): Form<AttendanceQuery>,
) -> Result<Response> {
    let date = query.date();
    let ids = filter_by_query(attendance_for(&state, date).await?, &query.text())
        .into_iter()
        .map(|r| r.id)
        .collect();
    let updated = state.attendance.mark_present(ids, &check_in_time()).await?;
    tracing::info!("Marked {} members present on {}", updated, date);
    Ok(Redirect::to(&query.url()?).into_response())
}

async fn workouts_page(
    state: &AdminState,
    admin: AdminUser,
    q: String,
    form: WorkoutForm,
    error: Option<String>,
) -> Result<Response> {
    let workouts = filter_by_query(state.store.list_workouts().await?, &q);
    let template = WorkoutsTemplate {
        admin,
        query: q,
        workouts,
        form,
        categories: WORKOUT_CATEGORIES,
        difficulties: WORKOUT_DIFFICULTIES,
        error,
    };
    Ok(render(&template)?.into_response())
}

pub async fn workouts(
    State(state): State<AdminState>,
    admin: AdminUser,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    workouts_page(&state, admin, query.text(), WorkoutForm::default(), None).await
}

pub async fn create_workout(
    State(state): State<AdminState>,
    admin: AdminUser,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    match state.store.create_workout(form.clone()).await {
        Ok(_) => Ok(Redirect::to("/admin/workouts").into_response()),
        Err(AppError::Validation(message)) => {
            workouts_page(&state, admin, String::new(), form, Some(message)).await
        }
        Err(e) => Err(e),
    }
}

pub async fn edit_workout_page(
    State(state): State<AdminState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let workout = state
        .store
        .find_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))?;

    let template = WorkoutEditTemplate {
        admin,
        form: WorkoutForm::from(&workout),
        workout_id: workout.id,
        categories: WORKOUT_CATEGORIES,
        difficulties: WORKOUT_DIFFICULTIES,
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn update_workout(
    State(state): State<AdminState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    match state.store.update_workout(&id, form.clone()).await {
        Ok(_) => Ok(Redirect::to("/admin/workouts").into_response()),
        Err(AppError::Validation(message)) => {
            let template = WorkoutEditTemplate {
                admin,
                workout_id: id,
                form,
                categories: WORKOUT_CATEGORIES,
                difficulties: WORKOUT_DIFFICULTIES,
                error: Some(message),
            };
            Ok(render(&template)?.into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_workout(
    State(state): State<AdminState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Response> {
    state.store.delete_workout(&id).await?;
    Ok(Redirect::to("/admin/workouts").into_response())
}

pub async fn settings(State(state): State<AdminState>, admin: AdminUser) -> Result<Response> {
    let mut settings = state.store.settings().await?;
    settings.username = admin.username.clone();

    let template = SettingsTemplate {
        admin,
        settings,
        message: None,
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn save_settings(
    State(state): State<AdminState>,
    Extension(sessions): Extension<SessionRepository>,
    jar: CookieJar,
    mut admin: AdminUser,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let settings = form.settings();

    let error = if settings.gym_name.is_empty() || settings.username.is_empty() {
        Some("Gym name and username are required".to_string())
    } else if form.new_password().is_some_and(|p| p.len() < 8) {
        Some("Password must be at least 8 characters".to_string())
    } else if settings.username != admin.username {
        match state.admin_repo.find_by_username(&settings.username).await? {
            Some(other) if other.id != admin.id => Some("Username is already taken".to_string()),
            _ => None,
        }
    } else {
        None
    };
    if error.is_some() {
        let template = SettingsTemplate {
            admin,
            settings,
            message: None,
            error,
        };
        return Ok(render(&template)?.into_response());
    }

    state.store.save_settings(&settings).await?;
    if settings.username != admin.username {
        state
            .admin_repo
            .update_username(&admin.id, &settings.username)
            .await?;
        admin.username = settings.username.clone();
    }
    if let Some(password) = form.new_password() {
        state.admin_repo.update_password(&admin.id, password).await?;
        // Other devices sign in again with the new password
        if let Some(token) = get_session_token(&jar, SessionScope::Admin) {
            sessions
                .delete_all_for_user_except(&admin.id, &token)
                .await?;
        }
        tracing::info!("Password changed for admin {}", admin.username);
    }

    let template = SettingsTemplate {
        admin,
        settings,
        message: Some("Settings saved".to_string()),
        error: None,
    };
    Ok(render(&template)?.into_response())
}
