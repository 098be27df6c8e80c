//! innboard-api - HTTP API server for the innboard document subsystem.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use governor::{Quota, RateLimiter};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use innboard_api::services::{
    MetadataResolver, RehydrationService, SigningService, TenantNameCache,
};
use innboard_api::state::AppState;
use innboard_db::{Database, FilesystemBackend, PoolConfig, StorageBackend, UrlSigner};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful
/// for log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter (default: "innboard_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "innboard_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("innboard-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/innboard".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let public_base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
    let signing_secret = std::env::var("URL_SIGNING_SECRET")
        .map_err(|_| anyhow::anyhow!("URL_SIGNING_SECRET must be set"))?;
    let storage_root = std::env::var("DOCUMENT_STORAGE_PATH")
        .unwrap_or_else(|_| "/var/lib/innboard/documents".to_string());
    let bucket = std::env::var("DOCUMENT_BUCKET").unwrap_or_else(|_| "onboarding".to_string());

    // Rate limiting configuration
    // RATE_LIMIT_REQUESTS: requests per period (default: 100)
    // RATE_LIMIT_PERIOD_SECS: period in seconds (default: 60)
    let rate_limit_requests: u64 = std::env::var("RATE_LIMIT_REQUESTS")
        .unwrap_or_else(|_| "100".to_string())
        .parse()
        .unwrap_or(100);
    let rate_limit_period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);
    let rate_limit_enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    // Pool sizing
    // DATABASE_MAX_CONNECTIONS: pool cap (default: 10)
    // DATABASE_CONNECT_TIMEOUT_SECS: acquire timeout (default: 30)
    let mut pool_config = PoolConfig::new();
    if let Some(n) = env_u32("DATABASE_MAX_CONNECTIONS") {
        pool_config = pool_config.max_connections(n);
    }
    if let Some(n) = env_u32("DATABASE_MIN_CONNECTIONS") {
        pool_config = pool_config.min_connections(n);
    }
    if let Some(secs) = env_u32("DATABASE_CONNECT_TIMEOUT_SECS") {
        pool_config = pool_config.connect_timeout(std::time::Duration::from_secs(secs as u64));
    }

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect_with_config(&database_url, pool_config).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize document storage and verify it actually works before
    // accepting traffic
    let backend = FilesystemBackend::new(&storage_root);
    backend
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("storage validation failed at {storage_root}: {e}"))?;
    info!("Document storage initialized at {}", storage_root);
    let storage: Arc<dyn StorageBackend> = Arc::new(backend);

    let signer = UrlSigner::new(signing_secret, public_base_url);

    // Create rate limiter if enabled
    let rate_limiter = if rate_limit_enabled {
        let quota = Quota::with_period(std::time::Duration::from_secs(rate_limit_period_secs))
            .ok_or_else(|| anyhow::anyhow!("Rate limit period must be non-zero"))?
            .allow_burst(
                NonZeroU32::new(rate_limit_requests as u32)
                    .ok_or_else(|| anyhow::anyhow!("Rate limit must be non-zero"))?,
            );
        info!(
            rate_limit_requests,
            rate_limit_period_secs, "Rate limiting enabled"
        );
        Some(Arc::new(RateLimiter::direct(quota)))
    } else {
        info!("Rate limiting disabled");
        None
    };

    // Create app state
    let documents = Arc::new(db.documents.clone());
    let uploads = Arc::new(db.uploads.clone());
    let tenants = TenantNameCache::new(Arc::new(db.tenants.clone()));

    let signing = Arc::new(SigningService::new(
        documents.clone(),
        MetadataResolver::new(uploads),
        tenants,
        storage.clone(),
        signer.clone(),
        bucket,
    ));
    let rehydrate = Arc::new(RehydrationService::new(
        documents,
        storage.clone(),
        signer.clone(),
    ));

    let state = AppState {
        signing,
        rehydrate,
        storage,
        signer,
        rate_limiter,
    };

    // Build router with middleware
    let app = innboard_api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600))
        })
        // Form payloads with inline signatures stay small; 16 MB is generous
        .layer(RequestBodyLimitLayer::new(16 * 1024 * 1024));

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Parse CORS_ALLOWED_ORIGINS (comma-separated) into header values,
/// defaulting to localhost dev origins.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let raw = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());
    raw.split(',')
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect()
}
