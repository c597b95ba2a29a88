use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    routing::{get, post},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{admin, auth, functions, health, pages};
use crate::repositories::{AdminUserRepository, SessionRepository};

pub struct AppStates {
    pub health: health::HealthState,
    pub functions: functions::FunctionsState,
    pub auth: auth::AuthState,
    pub pages: pages::PagesState,
    pub admin: admin::AdminState,
}

/// Function endpoints are called cross-origin from browser clients.
fn functions_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn create_router(
    states: AppStates,
    session_repo: SessionRepository,
    admin_repo: AdminUserRepository,
) -> Router {
    let function_routes = Router::new()
        .route("/create-user", post(functions::create_user))
        .route("/get-users", post(functions::get_users))
        .route("/get-user-detail", post(functions::get_user_detail))
        .route("/update-user-profile", post(functions::update_user_profile))
        .route("/create-subscription", post(functions::create_subscription))
        .route("/verify-payment", post(functions::verify_payment))
        .layer(functions_cors())
        .with_state(states.functions);

    Router::new()
        .route("/health", get(health::health_check))
        .with_state(states.health)
        // Member pages
        .route("/", get(pages::home))
        .route("/about-us", get(pages::about_us))
        .route("/plans", get(pages::plans))
        .route("/workouts", get(pages::workouts))
        .route("/workouts/{id}", get(pages::workout_detail))
        .route("/profile", get(pages::profile).post(pages::update_profile))
        .route("/profile/metrics", post(pages::update_metrics))
        .route("/bmi", get(pages::bmi))
        .route("/subscriptions", get(pages::subscriptions))
        .route("/subscriptions/checkout", post(pages::checkout))
        .route("/subscriptions/verify", post(pages::confirm_payment))
        .with_state(states.pages)
        // Auth routes
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/logout", post(auth::logout))
        .route(
            "/admin/login",
            get(auth::admin_login_page).post(auth::admin_login_submit),
        )
        .route(
            "/admin/setup",
            get(auth::admin_setup_page).post(auth::admin_setup_submit),
        )
        .route("/admin/logout", post(auth::admin_logout))
        .with_state(states.auth)
        // Admin routes
        .route("/admin", get(admin::dashboard))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/{id}", get(admin::user_detail))
        .route("/admin/subscriptions", get(admin::subscriptions))
        .route("/admin/attendance", get(admin::attendance))
        .route(
            "/admin/attendance/mark-all",
            post(admin::mark_all_present),
        )
        .route(
            "/admin/attendance/{id}/toggle",
            post(admin::toggle_attendance),
        )
        .route(
            "/admin/workouts",
            get(admin::workouts).post(admin::create_workout),
        )
        .route("/admin/workouts/{id}", post(admin::update_workout))
        .route("/admin/workouts/{id}/edit", get(admin::edit_workout_page))
        .route("/admin/workouts/{id}/delete", post(admin::delete_workout))
        .route(
            "/admin/settings",
            get(admin::settings).post(admin::save_settings),
        )
        .with_state(states.admin)
        .nest("/functions/v1", function_routes)
        // Repositories the auth extractors read
        .layer(Extension(session_repo))
        .layer(Extension(admin_repo))
        .layer(TraceLayer::new_for_http())
}
