//! Atlas server binary.
//!
//! Wires configuration, storage backends and the HTTP surface together.
//! Without a reachable database the server still starts on in-memory
//! stores, which is enough for local frontend work.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atlas_api::AppState;
use atlas_assets::{
    AssetLedger, LocalObjectStore, MemoryAssetLedger, MemoryObjectStore, ObjectStore, S3Config,
    S3ObjectStore,
};
use atlas_auth::JwtService;
use atlas_billing::{NoopVerifier, TestGateway};
use atlas_content::{
    BackgroundPicker, ContentCoordinator, ContentStore, KindConfig, MemoryContentStore,
};
use atlas_core::config::AppConfig;
use atlas_db::{Database, DatabaseConfig, PgAssetLedger, PgContentStore, UserRepository};
use atlas_notifications::ConsoleMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting Atlas"
    );

    let mut db_config = DatabaseConfig::with_url(&config.database.url);
    db_config.max_connections = config.database.pool_size;
    let db = match Database::connect(&db_config).await {
        Ok(db) => {
            info!("Connected to database");
            Some(db)
        }
        Err(e) => {
            warn!("Database unavailable ({}), falling back to in-memory stores", e);
            None
        }
    };

    let objects = build_object_store(&config);
    let (contents, ledger, users): (
        Arc<dyn ContentStore>,
        Arc<dyn AssetLedger>,
        Option<Arc<UserRepository>>,
    ) = match &db {
        Some(db) => (
            Arc::new(PgContentStore::new(db.pool().clone())),
            Arc::new(PgAssetLedger::new(db.pool().clone())),
            Some(Arc::new(UserRepository::new(db.pool().clone()))),
        ),
        None => (
            Arc::new(MemoryContentStore::new()),
            Arc::new(MemoryAssetLedger::new()),
            None,
        ),
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        classes: Arc::new(ContentCoordinator::new(
            KindConfig::CLASS,
            contents.clone(),
            ledger.clone(),
            objects.clone(),
        )),
        units: Arc::new(ContentCoordinator::new(
            KindConfig::UNIT,
            contents.clone(),
            ledger.clone(),
            objects.clone(),
        )),
        posts: Arc::new(ContentCoordinator::new(
            KindConfig::POST,
            contents.clone(),
            ledger.clone(),
            objects.clone(),
        )),
        picker: Arc::new(BackgroundPicker::new(
            contents,
            objects.clone(),
            Duration::from_secs(config.storage.signed_url_ttl_seconds),
        )),
        ledger,
        objects,
        jwt: Arc::new(JwtService::new(config.auth.jwt_secret.as_bytes())),
        users,
        mailer: Arc::new(ConsoleMailer::new()),
        gateway: Arc::new(TestGateway::default()),
        webhook_verifier: Arc::new(NoopVerifier),
    };

    let app = build_router(state, config.server.max_body_size_bytes);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,atlas_server=debug,atlas_api=debug,tower_http=debug".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn build_object_store(config: &AppConfig) -> Arc<dyn ObjectStore> {
    match config.storage.backend.as_str() {
        "s3" => match &config.storage.s3 {
            Some(s3) => Arc::new(S3ObjectStore::new(S3Config {
                bucket: s3.bucket.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                access_key_id: s3.access_key_id.clone(),
                secret_access_key: s3.secret_access_key.clone(),
                path_style: false,
            })),
            None => {
                warn!("S3 backend selected without settings, using in-memory store");
                Arc::new(MemoryObjectStore::new())
            }
        },
        _ => Arc::new(LocalObjectStore::new(
            &config.storage.local_path,
            &config.storage.local_base_url,
        )),
    }
}

fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(atlas_api::router())
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Arc::new(AppConfig::default());
        let contents: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        let ledger: Arc<dyn AssetLedger> = Arc::new(MemoryAssetLedger::new());
        let objects: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());

        AppState {
            config: config.clone(),
            classes: Arc::new(ContentCoordinator::new(
                KindConfig::CLASS,
                contents.clone(),
                ledger.clone(),
                objects.clone(),
            )),
            units: Arc::new(ContentCoordinator::new(
                KindConfig::UNIT,
                contents.clone(),
                ledger.clone(),
                objects.clone(),
            )),
            posts: Arc::new(ContentCoordinator::new(
                KindConfig::POST,
                contents.clone(),
                ledger.clone(),
                objects.clone(),
            )),
            picker: Arc::new(BackgroundPicker::new(
                contents,
                objects.clone(),
                Duration::from_secs(config.storage.signed_url_ttl_seconds),
            )),
            ledger,
            objects,
            jwt: Arc::new(JwtService::new(b"test-secret")),
            users: None,
            mailer: Arc::new(ConsoleMailer::new()),
            gateway: Arc::new(TestGateway::default()),
            webhook_verifier: Arc::new(NoopVerifier),
        }
    }

    fn test_app() -> Router {
        build_router(test_state(), 1024 * 1024)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_classes_empty() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/classes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_backgrounds_empty_pool_is_404() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/backgrounds?count=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mutation_requires_token() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/classes/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cancel_subscription_requires_token() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/billing/cancel")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
