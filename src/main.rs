use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fdgym::admin_store::AdminStore;
use fdgym::config::Config;
use fdgym::handlers::{admin, auth, functions, health, pages};
use fdgym::identity::IdentityService;
use fdgym::payment::PaymentGateway;
use fdgym::repositories::{
    AdminUserRepository, AttendanceRepository, LocalStoreRepository, MemberRepository,
    SessionRepository, SubscriptionRepository,
};
use fdgym::routes::{self, AppStates};
use fdgym::{db, migrations};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fdgym=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database: {}", config.database_url);
    let pool = db::create_pool(&config.database_url)?;
    migrations::run_migrations(&pool)?;

    // Create repositories
    let admin_repo = AdminUserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let member_repo = MemberRepository::new(pool.clone());
    let subscription_repo = SubscriptionRepository::new(pool.clone());
    let attendance_repo = AttendanceRepository::new(pool.clone());
    let store_repo = LocalStoreRepository::new(pool.clone());

    let identity = IdentityService::from_config(&config.identity, member_repo);
    tracing::info!("Identity provider: {}", identity.source());

    let gateway = PaymentGateway::from_config(&config.payment);
    if gateway.is_offline() {
        tracing::warn!("PAYMENT_KEY_ID not set, payments run in offline mode");
    }

    // Create handler states
    let functions_state = functions::FunctionsState {
        identity: identity.clone(),
        subscriptions: subscription_repo,
        gateway,
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
            attendance: attendance_repo,
            store: AdminStore::new(
                store_repo,
                Duration::from_millis(config.admin_demo_latency_ms),
            ),
            admin_repo: admin_repo.clone(),
        },
        functions: functions_state,
    };

    spawn_session_cleanup(session_repo.clone());

    let app = routes::create_router(states, session_repo, admin_repo);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn spawn_session_cleanup(session_repo: SessionRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match session_repo.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!("Removed {} expired sessions", removed),
                Err(e) => tracing::error!("Session cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
