#![allow(dead_code)]

use std::time::Duration;

use axum::{body::Body, http::Response, Router};
use http_body_util::BodyExt;
use serde_json::Value;

use fdgym::admin_store::AdminStore;
use fdgym::db::{create_memory_pool, DbPool};
use fdgym::handlers::{admin, auth, functions, health, pages};
use fdgym::identity::IdentityService;
use fdgym::migrations::run_migrations_for_tests;
use fdgym::models::{AdminAccount, AdminRole, CreateMember, Member};
use fdgym::payment::PaymentGateway;
use fdgym::repositories::{
    AdminUserRepository, AttendanceRepository, LocalStoreRepository, MemberRepository,
    SessionRepository, SessionScope, SubscriptionRepository,
};
use fdgym::routes::{create_router, AppStates};

pub const TEST_PAYMENT_SECRET: &str = "test_key_secret";

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn test_gateway() -> PaymentGateway {
    PaymentGateway::offline(TEST_PAYMENT_SECRET)
}

pub fn create_test_app(pool: DbPool) -> Router {
    let admin_repo = AdminUserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let identity = IdentityService::Local(MemberRepository::new(pool.clone()));

    let functions_state = functions::FunctionsState {
        identity: identity.clone(),
        subscriptions: SubscriptionRepository::new(pool.clone()),
        gateway: test_gateway(),
    };
    let states = AppStates {
        health: health::HealthState { pool: pool.clone() },
        auth: auth::AuthState {
            identity,
            admin_repo: admin_repo.clone(),
            session_repo: session_repo.clone(),
        },
        pages: pages::PagesState {
            functions: functions_state.clone(),
        },
        admin: admin::AdminState {
            functions: functions_state.clone(),
            attendance: AttendanceRepository::new(pool.clone()),
            store: AdminStore::new(LocalStoreRepository::new(pool.clone()), Duration::ZERO),
            admin_repo: admin_repo.clone(),
        },
        functions: functions_state,
    };

    create_router(states, session_repo, admin_repo)
}

pub async fn create_test_member(pool: &DbPool, first_name: &str, email: &str) -> Member {
    let member_repo = MemberRepository::new(pool.clone());
    member_repo
        .create(&CreateMember {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            phone: None,
        })
        .await
        .unwrap()
}

pub async fn create_test_admin(pool: &DbPool, username: &str, role: AdminRole) -> AdminAccount {
    let admin_repo = AdminUserRepository::new(pool.clone());
    admin_repo
        .create(username, "password123", role)
        .await
        .unwrap()
}

pub async fn member_cookie(pool: &DbPool, member_id: &str) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo
        .create(member_id, SessionScope::Member)
        .await
        .unwrap();
    format!("session={}", token)
}

pub async fn admin_cookie(pool: &DbPool, admin_id: &str) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo
        .create(admin_id, SessionScope::Admin)
        .await
        .unwrap();
    format!("admin_session={}", token)
}

pub fn extract_cookie_header(set_cookie: &str) -> String {
    // Extract just the cookie name=value part for use in Cookie header
    set_cookie.split(';').next().unwrap_or("").to_string()
}

pub async fn body_string(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
