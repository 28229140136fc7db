use dotenvy::dotenv;
use nightcore_backend::config::AppConfig;
use nightcore_backend::services::expiry::ExpiryService;
use nightcore_backend::services::storage::{ArtifactStore, LocalArtifactStore};
use nightcore_backend::services::transform::{AudioTransform, NightcoreTransform};
use nightcore_backend::services::upload_log::UploadLog;
use nightcore_backend::services::worker::BackgroundWorker;
use nightcore_backend::{AppState, create_app};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nightcore_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Nightcore Backend...");

    let config = AppConfig::from_env();
    info!(
        "🎛️  Config: storage={}, delay={}s, tones={}, max size={}MB",
        config.storage_dir.display(),
        config.delete_delay.as_secs(),
        config.tones,
        config.max_file_size / 1024 / 1024,
    );

    let storage: Arc<dyn ArtifactStore> =
        Arc::new(LocalArtifactStore::new(config.storage_dir.clone()));
    let transform: Arc<dyn AudioTransform> = Arc::new(NightcoreTransform::new(config.tones));
    let expiry = ExpiryService::new(storage.clone(), config.delete_delay);
    let upload_log = Arc::new(UploadLog::new(config.upload_log.clone(), config.timezone));

    let state = AppState {
        config: config.clone(),
        storage: storage.clone(),
        transform,
        expiry,
        upload_log,
    };

    // Setup Shutdown Channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Start Background Worker
    let worker = BackgroundWorker::new(storage.clone(), config.delete_delay, shutdown_rx);
    tokio::spawn(async move {
        worker.run().await;
    });

    let app = create_app(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .layer(axum::extract::DefaultBodyLimit::max(config.max_file_size));

    let addr = config.bind_addr;
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
