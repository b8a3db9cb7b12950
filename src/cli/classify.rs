//! Classify command

use anyhow::{Context, Result};
use difficulty_detector::answers::AnswerClassifier;
use difficulty_detector::config::AppConfig;
use difficulty_detector::models::CodeSubmission;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Run the classify command
pub fn run(
    config: &AppConfig,
    model: Option<PathBuf>,
    instruction: String,
    input_text: String,
    answer: Option<String>,
    answer_file: Option<&Path>,
) -> Result<()> {
    let model_path = model
        .or_else(|| config.answers.model_path.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No answer model given; pass --model or set answers.model_path")
        })?;
    let classifier = AnswerClassifier::load(&model_path)
        .with_context(|| format!("Failed to load answer model {}", model_path.display()))?;

    let user_answer = match (answer, answer_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read answer file {}", path.display()))?,
        (None, None) => anyhow::bail!("Pass --answer or --answer-file"),
    };

    let prediction = classifier.predict(&CodeSubmission {
        instruction,
        input_text,
        user_answer,
    });
    tracing::debug!(probabilities = ?prediction.probabilities, "answer classified");

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "label": prediction.label }))?
    );
    Ok(())
}
