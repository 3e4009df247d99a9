//! Aphasia trainer HTTP server
//!
//! Main entry point for the HTTP API server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::BootstrapOutcome;
use axum::http::{HeaderValue, Method};
use infrastructure::{
    AppConfig, Argon2PasswordHasher, AsyncDatabase, AsyncDatabaseConfig, FileScenarioCatalog,
    InMemorySessionStore, OllamaInferenceAdapter, SpeechAdapter, SqlxActivityLog,
    SqlxDatabaseHealth, SqlxUserStore, TranscriptionAdapter,
};
use presentation_http::{
    Ports, routes,
    state::AppState,
    tasks::{spawn_rate_limit_cleanup_task, spawn_session_purge_task},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,presentation_http=debug,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        // Development mode: allow all origins
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });
    init_tracing(config.server.json_logs());

    info!("Aphasia trainer v{} starting", env!("CARGO_PKG_VERSION"));
    for warning in config.warnings() {
        warn!("{warning}");
    }

    let database = AsyncDatabase::new(&AsyncDatabaseConfig::with_url(
        config.database_url(),
        config.database.max_connections,
    ))
    .await?;
    if config.database.run_migrations {
        database.migrate().await?;
    }

    let inference = OllamaInferenceAdapter::new(config.inference.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize inference: {e}"))?;
    let transcription = TranscriptionAdapter::new(config.transcription.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize transcription: {e}"))?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        backend = ?database.backend(),
        model = %config.inference.default_model,
        scenarios = %config.scenarios.dir,
        "Configuration loaded"
    );

    let ports = Ports {
        users: Arc::new(SqlxUserStore::new(database.pool().clone())),
        hasher: Arc::new(Argon2PasswordHasher::new()),
        sessions: Arc::new(InMemorySessionStore::new()),
        activity: Arc::new(SqlxActivityLog::new(database.pool().clone())),
        inference: Arc::new(inference),
        transcription: Arc::new(transcription),
        speech: Arc::new(SpeechAdapter::new(config.speech.clone())),
        scenarios: Arc::new(FileScenarioCatalog::new(&config.scenarios.dir)),
        database: Arc::new(SqlxDatabaseHealth::new(&database)),
    };

    let state = AppState::new(ports, config.clone())
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    if config.bootstrap.enabled {
        match state.bootstrap.seed().await? {
            BootstrapOutcome::Created(user) => {
                warn!(username = %user.username(), "Created bootstrap developer account");
            },
            BootstrapOutcome::AlreadyInitialized => info!("User store already initialized"),
        }
    }

    let purge_task = spawn_session_purge_task(
        Arc::clone(&state.sessions),
        Duration::from_secs(config.session.purge_interval_secs.max(1)),
    );
    let cleanup_task = spawn_rate_limit_cleanup_task(
        Arc::clone(&state.auth_limiter),
        Duration::from_secs(config.server.rate_limit_cleanup_interval_secs.max(1)),
    );

    let app = routes::create_router(state).layer(cors_layer(&config.server.allowed_origins));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{addr}");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
    .await?;

    purge_task.abort();
    cleanup_task.abort();
    database.pool().close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }

    info!("Waiting up to {timeout:?} for connections to close");
}
