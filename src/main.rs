use fraudguard_api::config::Config;
use fraudguard_api::gateway::AnalysisGateway;
use fraudguard_api::gemini_client::GeminiClient;
use fraudguard_api::handlers::{self, AppState};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading (the API key is read once, here).
/// - The Gemini client and analysis gateway.
/// - HTTP routes and middleware (CORS, body limit).
///
/// It then starts the Axum server. A missing API key does not stop startup;
/// analysis requests are refused until the service is restarted with one.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudguard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let client = GeminiClient::new(&config)?;
    tracing::info!(
        "✓ Gemini client initialized: {} ({})",
        config.gemini_base_url,
        config.gemini_model
    );
    let gateway = AnalysisGateway::new(config.clone(), Arc::new(client));

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, gateway));

    let app = handlers::router(app_state)
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
