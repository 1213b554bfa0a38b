use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use onec_bridge::config::{init_tracing, load_config};
use onec_bridge::db::{establish_connection_from_app_config, run_migrations};
use onec_bridge::{app_router, AppState};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let db = establish_connection_from_app_config(&config).await?;
    if config.auto_migrate {
        run_migrations(&db).await?;
    }

    let cors = build_cors(&config);
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Arc::new(db), Arc::new(config));

    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn build_cors(config: &onec_bridge::config::AppConfig) -> CorsLayer {
    if config.should_allow_permissive_cors() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter_map(|o| {
            let o = o.trim();
            if o.is_empty() {
                return None;
            }
            match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring unparseable CORS origin");
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        warn!("No CORS origins configured; cross-origin requests will be refused");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
