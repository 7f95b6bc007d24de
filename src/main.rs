//! PlayArena Backend Server
//!
//! HTTP API for account signup, OTP verification, login, user profiles, and
//! leagues, tournaments and teams.

use anyhow::Context;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{routing::get, Router};
use chrono::Duration;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use playarena_server::auth::{
    AuthService, InMemoryRevocationStore, LogNotifier, MailApiNotifier, OtpDispatcher,
    OtpGenerator, OtpNotifier, PgCredentialStore, RetryPolicy, SignupPolicy, TokenIssuer,
    TokenValidator,
};
use playarena_server::competition::{CompetitionService, PgCompetitionStore};
use playarena_server::config::Config;
use playarena_server::db;
use playarena_server::routes;
use playarena_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting PlayArena server");

    let db_pool = db::create_pool(&config).await?;
    db::run_migrations(&db_pool).await?;

    let notifier: Arc<dyn OtpNotifier> = match config.mail.clone() {
        Some(mail) => {
            tracing::info!(api_url = %mail.api_url, "OTP delivery via mail API");
            Arc::new(MailApiNotifier::new(mail))
        }
        None => {
            tracing::warn!("MAIL_API_URL not set, OTPs are only written to the debug log");
            Arc::new(LogNotifier)
        }
    };
    let dispatcher = OtpDispatcher::spawn(notifier, RetryPolicy::default());

    let credential_store = Arc::new(PgCredentialStore::new(db_pool.clone()));

    let auth_service = Arc::new(AuthService::new(
        credential_store.clone(),
        OtpGenerator::from_time(),
        TokenIssuer::new(config.jwt_secret.clone(), config.jwt_token_ttl_seconds),
        dispatcher,
        SignupPolicy {
            otp_length: config.otp_length,
            otp_ttl: Duration::seconds(config.otp_ttl_seconds),
            bcrypt_cost: config.bcrypt_cost,
        },
    ));

    let token_validator = Arc::new(TokenValidator::new(
        config.jwt_secret.clone(),
        Arc::new(InMemoryRevocationStore::new()),
    ));

    let competition_service = Arc::new(CompetitionService::new(
        Arc::new(PgCompetitionStore::new(db_pool.clone())),
        credential_store,
    ));

    let app_state = AppState::new(auth_service, token_validator, competition_service);

    let health_db_pool = db_pool.clone();

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::api_router(app_state))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn root() -> &'static str {
    "PlayArena API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency_ms: Option<u128>,
    version: &'static str,
}

async fn health_check(pool: sqlx::PgPool) -> (StatusCode, axum::Json<HealthResponse>) {
    let (code, status, database, latency) = match db::check_health(&pool).await {
        Ok(latency) => (StatusCode::OK, "healthy", "connected", Some(latency.as_millis())),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unavailable", None)
        }
    };

    (
        code,
        axum::Json(HealthResponse {
            status,
            database,
            database_latency_ms: latency,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins_str = config.cors_allowed_origins.clone().unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
