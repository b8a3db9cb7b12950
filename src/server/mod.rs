//! HTTP gateway
//!
//! Predictors are loaded into an [`AppState`] before the listener binds, so
//! a missing or broken artifact aborts start-up instead of failing the
//! first request. Handlers share the state read-only.

pub mod handlers;

use crate::answers::AnswerClassifier;
use crate::config::AppConfig;
use crate::predictor::{load_predictor, DifficultyPredictor};
use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn DifficultyPredictor>,
    /// Absent when no answer model is configured
    pub answers: Option<Arc<AnswerClassifier>>,
}

impl AppState {
    /// Load every configured model, failing on the first unusable one
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let predictor = load_predictor(
            config.predictor.kind,
            config.predictor.model_path.as_deref(),
        )
        .with_context(|| format!("Failed to load the {} predictor", config.predictor.kind))?;

        let answers = match &config.answers.model_path {
            Some(path) => {
                let model = AnswerClassifier::load(path).with_context(|| {
                    format!("Failed to load answer model {}", path.display())
                })?;
                tracing::info!("Loaded answer classifier from {}", path.display());
                Some(Arc::new(model))
            }
            None => None,
        };

        Ok(Self { predictor, answers })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/classify", post(handlers::classify))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Difficulty detector listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
