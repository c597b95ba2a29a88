mod common;

use fdgym::cache::{MemoryStore, ProfileCache};
use fdgym::client::GymClient;
use fdgym::db::DbPool;
use fdgym::models::{CreateMember, CreateSubscription, ProfileMetadata, UpdateProfile};
use fdgym::payment::PaymentCallback;
use serde_json::json;
use tokio::net::TcpListener;

/// Serve the app on an ephemeral port and return its base URL.
async fn spawn_server(pool: DbPool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = common::create_test_app(pool);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_client_signup_to_paid_subscription() {
    let pool = common::setup_test_db();
    let client = GymClient::new(&spawn_server(pool).await).with_api_key("anon");

    let user = client
        .create_user(&CreateMember {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@example.com".to_string(),
            password: "password123".to_string(),
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(user.full_name(), "Asha Rao");

    let pending = client
        .create_subscription(&CreateSubscription {
            user_id: user.id.clone(),
            plan_name: "Basic".to_string(),
            amount: 999,
            duration: "month".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(pending.razorpay.amount, 99900);

    let payment_id = "pay_client";
    let subscription = client
        .verify_payment(&PaymentCallback {
            razorpay_order_id: Some(pending.razorpay.order_id.clone()),
            razorpay_payment_id: Some(payment_id.to_string()),
            razorpay_signature: Some(common::test_gateway().sign(&pending.razorpay.order_id, payment_id)),
        })
        .await
        .unwrap();
    assert!(subscription.is_active());

    let users = client.get_users(10).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].subscription_status, "active");

    let detail = client.get_user_detail(&user.id).await.unwrap();
    assert_eq!(
        detail.subscription.map(|s| s.id),
        Some(pending.subscription.id)
    );
}

#[tokio::test]
async fn test_client_surfaces_function_errors() {
    let pool = common::setup_test_db();
    let client = GymClient::new(&spawn_server(pool).await);

    let err = client.get_user_detail("user_missing").await.unwrap_err();
    assert_eq!(err.public_message(), "User not found");

    let err = client
        .verify_payment(&PaymentCallback::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.public_message(),
        "Missing required payment verification parameters"
    );
}

#[tokio::test]
async fn test_client_update_profile_and_cache() {
    let pool = common::setup_test_db();
    let member = common::create_test_member(&pool, "Asha", "asha@example.com").await;
    let client = GymClient::new(&spawn_server(pool).await);

    let unchanged = client
        .update_user_profile(&member.id, &UpdateProfile::default())
        .await
        .unwrap();
    assert!(unchanged.is_none());

    let updated = client
        .update_user_profile(
            &member.id,
            &UpdateProfile {
                metadata: Some(ProfileMetadata {
                    height: Some(180.0),
                    weight: Some(81.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.metadata.bmi(), Some(25.0));

    let mut cache = ProfileCache::new(MemoryStore::new(), client);
    let profile = cache.load(&member.id).await.unwrap();
    assert_eq!(profile["id"], member.id.as_str());
    assert_eq!(profile["metadata"]["height"], 180.0);

    let merged = cache
        .update(json!({ "first_name": "Ashwini" }))
        .unwrap()
        .unwrap();
    assert_eq!(merged["first_name"], "Ashwini");
    assert_eq!(merged["id"], member.id.as_str());
}
