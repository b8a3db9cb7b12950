//! Predict, score and update commands
//!
//! Results go to stdout (or `--output`) as JSON; diagnostics go to stderr.

use anyhow::{Context, Result};
use difficulty_detector::config::AppConfig;
use difficulty_detector::features::parse_object;
use difficulty_detector::models::{LabeledSession, PredictionOutcome};
use difficulty_detector::predictor::{
    load_predictor, refit, respond, HeuristicPredictor, PredictorKind, SampleStore,
};
use serde_json::json;
use std::path::{Path, PathBuf};

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))
}

fn write_output(output: Option<&Path>, json: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write output file {}", path.display()))
        }
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

/// Emit the outcome, turning a rejected input into a non-zero exit
fn finish(outcome: &PredictionOutcome, output: Option<&Path>) -> Result<()> {
    write_output(output, &serde_json::to_string_pretty(outcome)?)?;
    if let PredictionOutcome::Failure(failure) = outcome {
        anyhow::bail!("Invalid input: {}", failure.error);
    }
    Ok(())
}

/// Run the predict command
pub fn run(
    config: &AppConfig,
    model: Option<PathBuf>,
    predictor: Option<PredictorKind>,
    input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let kind = predictor
        .or(model.as_ref().map(|_| PredictorKind::Learned))
        .unwrap_or(config.predictor.kind);
    let model_path = model.or_else(|| config.predictor.model_path.clone());

    let predictor = load_predictor(kind, model_path.as_deref())
        .with_context(|| format!("Failed to load the {} predictor", kind))?;

    let raw = read_input(input)?;
    let outcome = respond(predictor.as_ref(), &raw);
    finish(&outcome, output)
}

/// Run the score command
pub fn score(json: &str) -> Result<()> {
    let outcome = respond(&HeuristicPredictor::new(), json);
    finish(&outcome, None)
}

/// Run the update command
pub fn update(config: &AppConfig, model: &Path, input: &Path) -> Result<()> {
    let raw = read_input(input)?;
    let session: LabeledSession = parse_object(&raw)
        .with_context(|| format!("Invalid session in {}", input.display()))?;

    let store = SampleStore::for_model(model);
    store
        .record(&session)
        .with_context(|| format!("Failed to record sample in {}", store.data_path().display()))?;

    let stats = store.stats()?;
    tracing::info!("Sample store: {}", stats);

    if !stats.has_both_labels() {
        tracing::info!("Waiting for both labels before refitting; model left unchanged");
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "success": true,
                "retrained": false,
                "samples": stats,
            }))?
        );
        return Ok(());
    }

    let sessions: Vec<LabeledSession> = store
        .load_all()?
        .into_iter()
        .map(|s| s.session)
        .collect();
    let (predictor, metrics) = refit(&sessions, &config.training.gbdt_params())?;
    predictor
        .save(model)
        .with_context(|| format!("Failed to save model to {}", model.display()))?;
    tracing::info!("Refit model saved to {}", model.display());

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "success": true,
            "retrained": true,
            "samples": stats,
            "metrics": metrics,
        }))?
    );
    Ok(())
}
