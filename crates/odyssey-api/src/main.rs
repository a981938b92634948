//! Odyssey API server entry point.

use odyssey_api::config::ApiConfig;
use odyssey_api::error::AppError;
use odyssey_api::state::AppState;
use odyssey_gemini::client::GeminiBackend;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is not an error.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "loaded environment file");
    }
    tracing::info!("Starting Odyssey API server");

    let config = ApiConfig::from_env()?;
    let addr = config.socket_addr()?;

    tracing::info!(
        model = %config.gemini.model,
        mode = ?config.gemini.mode,
        wire_format = %config.gemini.wire_format,
        response_format = %config.response_format,
        max_attempts = config.settings.retry.max_attempts,
        "configuration loaded"
    );

    let backend = GeminiBackend::new(config.gemini)?;
    let shutdown = CancellationToken::new();
    let app_state = AppState::new(
        std::sync::Arc::new(backend),
        config.settings,
        config.response_format,
        config.api_tokens,
        shutdown.clone(),
    );

    // TODO: Replace CorsLayer::permissive() with the browser client's origin.
    let app = odyssey_api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, cancelling `token` so that in-flight
/// generations stop before their next attempt.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}
