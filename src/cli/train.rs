//! Train commands for both learned models

use anyhow::{Context, Result};
use console::style;
use difficulty_detector::answers::{load_examples, train_answers, SgdConfig};
use difficulty_detector::config::AppConfig;
use difficulty_detector::models::LabeledSession;
use difficulty_detector::predictor::{synthetic, train};
use serde_json::json;
use std::path::Path;

/// Run the train command
pub fn run(
    config: &AppConfig,
    model: &Path,
    data: Option<&Path>,
    samples: Option<usize>,
) -> Result<()> {
    let training = &config.training;

    let sessions: Vec<LabeledSession> = match data {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read training data {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| {
                format!(
                    "Training data {} must be a JSON array of labelled sessions",
                    path.display()
                )
            })?
        }
        None => {
            let n = samples.unwrap_or(training.synthetic_samples);
            tracing::info!("Generating {} synthetic sessions (seed {})", n, training.seed);
            synthetic::generate(n, training.seed)
        }
    };

    let (predictor, metrics) = train(&sessions, &training.train_config())?;
    predictor
        .save(model)
        .with_context(|| format!("Failed to save model to {}", model.display()))?;
    tracing::info!("Model saved to {}", model.display());

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "success": true,
            "metrics": metrics,
        }))?
    );
    Ok(())
}

/// Run the train-answers command
pub fn answers(config: &AppConfig, data: &Path, output: &Path) -> Result<()> {
    let examples = load_examples(data)
        .with_context(|| format!("Failed to load answers from {}", data.display()))?;
    if examples.is_empty() {
        anyhow::bail!("No labelled answers found in {}", data.display());
    }

    let sgd = SgdConfig {
        seed: config.training.seed,
        ..Default::default()
    };
    let (model, report) = train_answers(&examples, config.training.test_fraction, &sgd)?;
    model
        .save(output)
        .with_context(|| format!("Failed to save model to {}", output.display()))?;

    println!("{}", report);
    println!(
        "{} Saved answer classifier to {}",
        style("✓").green(),
        style(output.display()).cyan()
    );
    Ok(())
}
