mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fdgym::payment::compute_signature;
use fdgym::repositories::SubscriptionRepository;
use fdgym::models::SubscriptionStatus;
use serde_json::{json, Value};
use tower::ServiceExt;

fn function_request(name: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/functions/v1/{name}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: Router, name: &str, body: Value) -> (StatusCode, Value) {
    let response = app.oneshot(function_request(name, body)).await.unwrap();
    let status = response.status();
    (status, common::body_json(response).await)
}

/// Create a pending subscription through the endpoint and return its order id.
async fn pending_order(app: Router, user_id: &str) -> String {
    let (status, body) = call(
        app,
        "create-subscription",
        json!({
            "user_id": user_id,
            "plan_name": "Premium",
            "amount": 2499,
            "duration": "3 months",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["razorpay"]["order_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_subscription_returns_pending_checkout() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let (status, body) = call(
        app,
        "create-subscription",
        json!({
            "user_id": "user_1",
            "plan_name": "Basic",
            "amount": 999,
            "duration": "month",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["subscription"]["status"], "pending");
    assert_eq!(body["subscription"]["user_id"], "user_1");
    assert_eq!(body["razorpay"]["amount"], 99900);
    assert_eq!(body["razorpay"]["currency"], "INR");

    let order_id = body["razorpay"]["order_id"].as_str().unwrap();
    let stored = SubscriptionRepository::new(pool)
        .find_by_order_id(order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Pending);
    assert!(stored.end_date.is_some());
}

#[tokio::test]
async fn test_create_subscription_missing_fields() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let (status, body) = call(app, "create-subscription", json!({ "user_id": "user_1" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required subscription fields");
}

#[tokio::test]
async fn test_create_subscription_with_huge_duration() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let (status, body) = call(
        app,
        "create-subscription",
        json!({
            "user_id": "user_1",
            "plan_name": "Lifetime",
            "amount": 999,
            "duration": "400000000 years",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["subscription"]["end_date"].is_null());
}

#[tokio::test]
async fn test_verify_payment_valid_signature_activates() {
    let pool = common::setup_test_db();
    let order_id = pending_order(common::create_test_app(pool.clone()), "user_1").await;
    let signature = compute_signature(&order_id, "pay_123", common::TEST_PAYMENT_SECRET);

    let (status, body) = call(
        common::create_test_app(pool.clone()),
        "verify-payment",
        json!({
            "razorpay_order_id": order_id,
            "razorpay_payment_id": "pay_123",
            "razorpay_signature": signature,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment verified successfully");
    assert_eq!(body["subscription"]["status"], "active");
    assert_eq!(body["subscription"]["payment_id"], "pay_123");

    let stored = SubscriptionRepository::new(pool)
        .find_by_order_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_verify_payment_invalid_signature_leaves_pending() {
    let pool = common::setup_test_db();
    let order_id = pending_order(common::create_test_app(pool.clone()), "user_1").await;
    let signature = compute_signature(&order_id, "pay_123", "some_other_secret");

    let (status, body) = call(
        common::create_test_app(pool.clone()),
        "verify-payment",
        json!({
            "razorpay_order_id": order_id,
            "razorpay_payment_id": "pay_123",
            "razorpay_signature": signature,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Payment verification failed: Invalid signature");

    let stored = SubscriptionRepository::new(pool)
        .find_by_order_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Pending);
    assert!(stored.payment_id.is_none());
}

#[tokio::test]
async fn test_verify_payment_rejects_uppercase_or_padded_signature() {
    let pool = common::setup_test_db();
    let order_id = pending_order(common::create_test_app(pool.clone()), "user_1").await;
    let signature = compute_signature(&order_id, "pay_123", common::TEST_PAYMENT_SECRET);

    for variant in [signature.to_uppercase(), format!("{signature} ")] {
        let (status, body) = call(
            common::create_test_app(pool.clone()),
            "verify-payment",
            json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_123",
                "razorpay_signature": variant,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Payment verification failed: Invalid signature");
    }

    let stored = SubscriptionRepository::new(pool)
        .find_by_order_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Pending);
}

#[tokio::test]
async fn test_verify_payment_missing_parameters() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let (status, body) = call(
        app,
        "verify-payment",
        json!({ "razorpay_order_id": "order_1", "razorpay_payment_id": "pay_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Missing required payment verification parameters");
}

#[tokio::test]
async fn test_verify_payment_unknown_order() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);
    let signature = compute_signature("order_missing", "pay_1", common::TEST_PAYMENT_SECRET);

    let (status, body) = call(
        app,
        "verify-payment",
        json!({
            "razorpay_order_id": "order_missing",
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": signature,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to update subscription status");
}

#[tokio::test]
async fn test_create_user_returns_201() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let (status, body) = call(
        app,
        "create-user",
        json!({
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "asha@example.com",
            "password": "password123",
            "phone": "+919800000000",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["first_name"], "Asha");
    assert_eq!(
        body["user"]["email_addresses"][0]["email_address"],
        "asha@example.com"
    );
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let pool = common::setup_test_db();
    common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let app = common::create_test_app(pool);

    let (status, body) = call(
        app,
        "create-user",
        json!({
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "asha@example.com",
            "password": "password123",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "A user with this email already exists");
}

#[tokio::test]
async fn test_get_users_tags_subscription_status() {
    let pool = common::setup_test_db();
    let active = common::create_test_member(&pool, "Active", "active@example.com").await;
    common::create_test_member(&pool, "Idle", "idle@example.com").await;

    let order_id = pending_order(common::create_test_app(pool.clone()), &active.id).await;
    SubscriptionRepository::new(pool.clone())
        .activate_by_order_id(&order_id, "pay_1")
        .await
        .unwrap();

    let app = common::create_test_app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/functions/v1/get-users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        let expected = if user["id"] == active.id.as_str() {
            "active"
        } else {
            "inactive"
        };
        assert_eq!(user["subscription_status"], expected);
    }
}

#[tokio::test]
async fn test_get_user_detail() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let app = common::create_test_app(pool);

    let (status, body) = call(app, "get-user-detail", json!({ "userId": member.id })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], member.id.as_str());
    assert!(body["user"]["subscription"].is_null());
}

#[tokio::test]
async fn test_get_user_detail_requires_id() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let (status, body) = call(app, "get-user-detail", json!({})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "User ID is required");
}

#[tokio::test]
async fn test_get_user_detail_unknown_user() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let (status, body) = call(app, "get-user-detail", json!({ "userId": "user_nobody" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_update_user_profile_merges_metadata() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;

    let (status, _) = call(
        common::create_test_app(pool.clone()),
        "update-user-profile",
        json!({ "userId": member.id, "metadata": { "height": 170.0, "goal": "strength" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        common::create_test_app(pool),
        "update-user-profile",
        json!({ "userId": member.id, "first_name": "Ashwini", "metadata": { "weight": 65.0 } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["first_name"], "Ashwini");
    assert_eq!(body["user"]["metadata"]["height"], 170.0);
    assert_eq!(body["user"]["metadata"]["weight"], 65.0);
    assert_eq!(body["user"]["metadata"]["goal"], "strength");
}

#[tokio::test]
async fn test_update_user_profile_without_changes() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let app = common::create_test_app(pool);

    let (status, body) = call(app, "update-user-profile", json!({ "userId": member.id })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "No updates provided");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/functions/v1/create-subscription")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/functions/v1/verify-payment")
                .header(header::ORIGIN, "https://app.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(
                    header::ACCESS_CONTROL_REQUEST_HEADERS,
                    "authorization, content-type, apikey",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    let allowed = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(allowed.contains("apikey"));
    assert!(allowed.contains("x-client-info"));
}

#[tokio::test]
async fn test_function_response_carries_cors_header() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/functions/v1/get-users")
                .header(header::ORIGIN, "https://app.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
