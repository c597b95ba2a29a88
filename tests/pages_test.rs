mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use fdgym::models::SubscriptionStatus;
use fdgym::payment::compute_signature;
use fdgym::repositories::{MemberRepository, SubscriptionRepository};
use tower::ServiceExt;

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, cookie: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Value of the hidden input `name` in a rendered form.
fn hidden_value(html: &str, name: &str) -> String {
    let marker = format!("name=\"{name}\" value=\"");
    let start = html.find(&marker).unwrap() + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

#[tokio::test]
async fn test_home_lists_plans_and_workouts() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Premium"));
    assert!(body.contains("Full Body HIIT"));
    assert!(body.contains("Join now"));
}

#[tokio::test]
async fn test_workout_detail_and_unknown_workout() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool.clone())
        .oneshot(get_with_cookie("/workouts/1", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Burpees"));

    let response = common::create_test_app(pool)
        .oneshot(get_with_cookie("/workouts/999", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_metrics_shows_bmi() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/profile/metrics",
            &cookie,
            "height=175&weight=70&age=30".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/profile");

    let stored = MemberRepository::new(pool.clone())
        .find_by_id(&member.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.metadata.height, Some(175.0));
    assert_eq!(stored.metadata.age, Some(30));

    let response = common::create_test_app(pool)
        .oneshot(get_with_cookie("/profile", &cookie))
        .await
        .unwrap();
    let body = common::body_string(response).await;
    assert!(body.contains("22.9"));
    assert!(body.contains("Normal weight"));
}

#[tokio::test]
async fn test_update_metrics_rejects_text() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool)
        .oneshot(post_form(
            "/profile/metrics",
            &cookie,
            "height=tall&weight=70".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Height must be a number"));
}

#[tokio::test]
async fn test_bmi_page_uses_query_values() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool)
        .oneshot(get_with_cookie("/bmi?height=170&weight=90", &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("31.1"));
    assert!(body.contains("Obese"));
}

#[tokio::test]
async fn test_update_profile_name() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/profile",
            &cookie,
            "first_name=Ashwini&last_name=&image_url=".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let stored = MemberRepository::new(pool)
        .find_by_id(&member.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.first_name, "Ashwini");
    assert_eq!(stored.last_name, "Tester");
}

#[tokio::test]
async fn test_offline_checkout_then_confirm_activates() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/subscriptions/checkout",
            &cookie,
            "plan=Premium".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = common::body_string(response).await;
    assert!(html.contains("Confirm payment"));

    let order_id = hidden_value(&html, "razorpay_order_id");
    let payment_id = hidden_value(&html, "razorpay_payment_id");
    let signature = hidden_value(&html, "razorpay_signature");
    assert_eq!(
        signature,
        compute_signature(&order_id, &payment_id, common::TEST_PAYMENT_SECRET)
    );

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/subscriptions/verify",
            &cookie,
            format!(
                "razorpay_order_id={order_id}&razorpay_payment_id={payment_id}&razorpay_signature={signature}"
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/profile");

    let subscription = SubscriptionRepository::new(pool.clone())
        .find_active_for_user(&member.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.plan_name, "Premium");
    assert_eq!(subscription.status, SubscriptionStatus::Active);

    let response = common::create_test_app(pool)
        .oneshot(get_with_cookie("/subscriptions", &cookie))
        .await
        .unwrap();
    let body = common::body_string(response).await;
    assert!(body.contains("days remaining"));
}

#[tokio::test]
async fn test_confirm_payment_rejects_bad_signature() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/subscriptions/checkout",
            &cookie,
            "plan=Basic".to_string(),
        ))
        .await
        .unwrap();
    let html = common::body_string(response).await;
    let order_id = hidden_value(&html, "razorpay_order_id");

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/subscriptions/verify",
            &cookie,
            format!("razorpay_order_id={order_id}&razorpay_payment_id=pay_x&razorpay_signature=deadbeef"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let pending = SubscriptionRepository::new(pool)
        .find_by_order_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, SubscriptionStatus::Pending);
}

#[tokio::test]
async fn test_confirm_payment_for_another_members_order() {
    let pool = common::setup_test_db();
    let owner = common::create_test_member(&pool, "Owner", "owner@example.com").await;
    let other = common::create_test_member(&pool, "Other", "other@example.com").await;
    let owner_cookie = common::member_cookie(&pool, &owner.id).await;
    let other_cookie = common::member_cookie(&pool, &other.id).await;

    let response = common::create_test_app(pool.clone())
        .oneshot(post_form(
            "/subscriptions/checkout",
            &owner_cookie,
            "plan=Basic".to_string(),
        ))
        .await
        .unwrap();
    let html = common::body_string(response).await;
    let order_id = hidden_value(&html, "razorpay_order_id");
    let payment_id = hidden_value(&html, "razorpay_payment_id");
    let signature = hidden_value(&html, "razorpay_signature");

    let response = common::create_test_app(pool)
        .oneshot(post_form(
            "/subscriptions/verify",
            &other_cookie,
            format!(
                "razorpay_order_id={order_id}&razorpay_payment_id={payment_id}&razorpay_signature={signature}"
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_checkout_unknown_plan() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let cookie = common::member_cookie(&pool, &member.id).await;

    let response = common::create_test_app(pool)
        .oneshot(post_form(
            "/subscriptions/checkout",
            &cookie,
            "plan=Platinum".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
