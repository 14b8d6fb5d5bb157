use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use deckstream_core::{
    config::{gemini_model_from_env_value, stream_budget_from_env_value},
    CoreConfig,
};

/// Main entry point for the deckstream server
///
/// Resolves configuration once from the environment (and `.env`), then serves the REST/SSE API
/// with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `DECKSTREAM_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `GEMINI_API_KEY`: model provider credential; without it generation requests get `401`
/// - `GEMINI_MODEL`: model name (default: "gemini-2.5-pro")
/// - `DECKSTREAM_STREAM_BUDGET_SECS`: generation time budget in seconds (default: 55)
/// - `UNSPLASH_ACCESS_KEY`: stock image search credential; without it image lookups return no URL
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deckstream_run=info".parse()?)
                .add_directive("deckstream_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("DECKSTREAM_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        std::env::var("GEMINI_API_KEY").ok(),
        gemini_model_from_env_value(std::env::var("GEMINI_MODEL").ok()),
        stream_budget_from_env_value(std::env::var("DECKSTREAM_STREAM_BUDGET_SECS").ok())?,
        std::env::var("UNSPLASH_ACCESS_KEY").ok(),
    )?);
    tracing::info!("configuration: {:?}", cfg);

    let app = router(AppState::from_config(&cfg));

    tracing::info!("++ Starting deckstream REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
