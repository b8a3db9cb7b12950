//! Difficulty prediction
//!
//! One [`DifficultyPredictor`] contract with two implementations:
//! - [`HeuristicPredictor`]: deterministic scoring rules, needs no artifact
//! - [`GbdtPredictor`]: gradient-boosted trees trained on labelled sessions
//!
//! Gateways load a predictor once with [`load_predictor`] and share the
//! returned handle across requests. [`respond`] is the boundary used by
//! both the CLI and the HTTP server: it turns unstructured input into
//! either a prediction or the structured failure object.

pub mod feedback;
pub mod gbdt_model;
pub mod heuristic;
pub mod synthetic;
pub mod train;

pub use feedback::SampleStore;
pub use gbdt_model::{GbdtParams, GbdtPredictor};
pub use heuristic::{DifficultyScore, HeuristicPredictor};
pub use train::{refit, train, TrainConfig, TrainMetrics};

use crate::features::{extract_metrics, parse_raw_interaction};
use crate::models::{InteractionMetrics, PredictionFailure, PredictionOutcome, PredictionResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const INSIGHT_FALLBACK_CHALLENGING: &str =
    "Your viewing pattern suggests you may find this content challenging";
pub const INSIGHT_FALLBACK_COMFORTABLE: &str =
    "Your viewing pattern suggests comfortable understanding of the content";

/// Insight used when no rule produced one
pub fn fallback_insight(is_difficult: bool) -> &'static str {
    if is_difficult {
        INSIGHT_FALLBACK_CHALLENGING
    } else {
        INSIGHT_FALLBACK_COMFORTABLE
    }
}

/// Anything that can turn a session into a difficulty verdict.
///
/// Implementations are immutable after construction and shared between
/// request handlers, so prediction takes `&self` and cannot fail.
pub trait DifficultyPredictor: Send + Sync {
    /// Short identifier reported by the health endpoint and logs
    fn name(&self) -> &'static str;

    fn predict(&self, metrics: &InteractionMetrics) -> PredictionResult;
}

/// Which predictor implementation to load
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PredictorKind {
    #[default]
    Heuristic,
    Learned,
}

impl PredictorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictorKind::Heuristic => "heuristic",
            PredictorKind::Learned => "learned",
        }
    }
}

impl std::str::FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "rules" => Ok(PredictorKind::Heuristic),
            "learned" | "gbdt" | "model" => Ok(PredictorKind::Learned),
            other => Err(format!(
                "unknown predictor '{}' (expected 'heuristic' or 'learned')",
                other
            )),
        }
    }
}

impl std::fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from loading, training or persisting a predictor
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("model file not found: {}", .0.display())]
    MissingModel(PathBuf),

    #[error("the learned predictor needs a model path")]
    NoModelPath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("training failed: {0}")]
    Training(String),
}

/// Load a predictor once, before any request is served.
///
/// The heuristic needs no artifact and ignores `model_path`. The learned
/// predictor fails when the path is missing or the artifact unreadable.
pub fn load_predictor(
    kind: PredictorKind,
    model_path: Option<&Path>,
) -> Result<Arc<dyn DifficultyPredictor>, PredictorError> {
    match kind {
        PredictorKind::Heuristic => Ok(Arc::new(HeuristicPredictor::new())),
        PredictorKind::Learned => {
            let path = model_path.ok_or(PredictorError::NoModelPath)?;
            let model = GbdtPredictor::load(path)?;
            tracing::info!("Loaded learned predictor from {}", path.display());
            Ok(Arc::new(model))
        }
    }
}

/// Predict from raw JSON input, reporting malformed input as a failure
/// object instead of an error.
pub fn respond(predictor: &dyn DifficultyPredictor, input: &str) -> PredictionOutcome {
    match parse_raw_interaction(input) {
        Ok(raw) => {
            let metrics = extract_metrics(&raw);
            PredictionOutcome::Success(predictor.predict(&metrics))
        }
        Err(e) => {
            tracing::warn!("Rejected prediction input: {}", e);
            PredictionOutcome::Failure(PredictionFailure::new(e.to_string()))
        }
    }
}
