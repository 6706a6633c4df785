//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JsonFileHistoryRepository, OpenAiInferenceAdapter},
    config::Config,
    error::ApiError,
    web::{router, AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{header::CONTENT_TYPE, Method};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(&config.inference_api_key)
        .with_api_base(&config.inference_base_url);
    let client = Client::with_config(openai_config);

    let inference = Arc::new(OpenAiInferenceAdapter::new(
        client,
        config.exam_model.clone(),
        config.analysis_model.clone(),
    ));
    let history_repo = Arc::new(JsonFileHistoryRepository::new(config.history_path.clone()));
    info!(
        "Inference backend at {} (exam model: {}, analysis model: {})",
        config.inference_base_url, config.exam_model, config.analysis_model
    );

    // --- 3. Build the Shared AppState (loads the history once) ---
    let app_state = Arc::new(
        AppState::new(config.clone(), inference.clone(), inference, history_repo).await,
    );

    // --- 4. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);
    let app = router(app_state).layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
