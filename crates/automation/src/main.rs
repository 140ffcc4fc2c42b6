//! Parish Automation Server
//!
//! An async Rust server that reacts to church-management domain events by
//! running operator-defined workflows: trigger matching, conditionally gated
//! and optionally delayed actions, and a full execution audit trail.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parish_automation::{
    config::{AppConfig, DatabaseConfig, GatewayConfig},
    db::{create_pool, ensure_schema, PgExecutionStore},
    engine::{ActionExecutor, ExecutionStore, WorkflowEngine},
    handlers,
    services::WorkflowService,
    state::AppState,
    transport::ChmsGateway,
};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,parish_automation=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the application router with all routes.
fn build_router(state: AppState) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Health check routes (no auth required)
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health));

    // Event ingestion and manual triggering
    let event_routes = Router::new()
        .route("/api/events", post(handlers::ingest_event))
        .route("/api/workflows/execute", post(handlers::manual_trigger));

    // Workflow definition routes
    let workflow_routes = Router::new()
        .route("/api/workflows", post(handlers::workflows::create))
        .route("/api/workflows", get(handlers::workflows::list))
        .route("/api/workflows/{id}", get(handlers::workflows::get))
        .route("/api/workflows/{id}", delete(handlers::workflows::delete))
        .route(
            "/api/workflows/{id}/status",
            post(handlers::workflows::set_status),
        )
        .route(
            "/api/workflows/{id}/actions",
            put(handlers::workflows::replace_actions),
        );

    // Audit trail routes
    let execution_routes = Router::new()
        .route("/api/executions", get(handlers::executions::list))
        .route("/api/executions/{id}", get(handlers::executions::get))
        .route(
            "/api/workflows/{id}/executions",
            get(handlers::executions::list_for_workflow),
        );

    Router::new()
        .merge(health_routes)
        .merge(event_routes)
        .merge(workflow_routes)
        .merge(execution_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Parish Automation"
    );

    // Load configuration
    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load app config, using defaults");
        AppConfig::default()
    });

    let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load database config, using defaults");
        DatabaseConfig::default()
    });

    let gateway_config = GatewayConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load gateway config, using defaults");
        GatewayConfig::default()
    });

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        debug = app_config.debug,
        run_timeout_seconds = app_config.run_timeout_seconds,
        "Configuration loaded"
    );

    // Create database connection pool and ensure the schema exists
    let db_pool = create_pool(&db_config).await?;
    ensure_schema(&db_pool).await?;

    // Wire the engine: collaborators, registry, store
    let gateway = Arc::new(ChmsGateway::new(&gateway_config));
    let executor = ActionExecutor::new(
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        gateway,
    );

    let workflow_service = WorkflowService::new(db_pool.clone());
    let store: Arc<dyn ExecutionStore> = Arc::new(PgExecutionStore::new(db_pool.clone()));

    let engine = WorkflowEngine::new(
        Arc::new(workflow_service.clone()),
        store.clone(),
        Arc::new(executor),
        app_config.run_timeout(),
    );

    // Create application state
    let state = AppState::new(
        db_pool,
        app_config.clone(),
        engine,
        workflow_service,
        store,
    );

    // Build the router
    let app = build_router(state);

    // Bind to address
    let addr: SocketAddr = app_config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
