//! Learned difficulty predictor
//!
//! Wraps the `gbdt` crate: a gradient-boosted tree ensemble over the
//! fixed-order interaction vector, trained with the `LogLikelyhood` loss
//! (label 1.0 = difficult, -1.0 = not difficult) so `predict` returns the
//! probability of difficulty.
//!
//! The gbdt crate works in `f32`; metrics are `f64` and are converted at
//! the crate boundary.

use std::path::Path;

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;

use super::{fallback_insight, DifficultyPredictor, PredictorError};
use crate::models::{InteractionMetrics, PredictionResult};

pub const INSIGHT_MANY_PAUSES: &str =
    "High number of pauses detected, suggesting difficulty with content";
pub const INSIGHT_LONG_PAUSES: &str =
    "Long pauses suggest user is struggling with complex concepts";
pub const INSIGHT_REPLAYED: &str =
    "Significant content replayed, suggesting difficulty understanding key points";
pub const INSIGHT_SLOWED: &str = "Reduced playback speed suggests content is challenging";
pub const INSIGHT_GAVE_UP: &str =
    "Large content skips with few seek events may indicate giving up on difficult sections";
pub const INSIGHT_SPED_UP: &str =
    "Increased playback speed suggests comfortable understanding of content";
pub const INSIGHT_NAVIGATING: &str =
    "Multiple small skips suggest efficient navigation of familiar content";

#[inline]
fn metrics_to_f32(metrics: &InteractionMetrics) -> Vec<f32> {
    metrics.to_vector().iter().map(|&v| v as f32).collect()
}

/// Boosted-tree model behind the [`DifficultyPredictor`] contract
pub struct GbdtPredictor {
    model: GBDT,
}

impl GbdtPredictor {
    /// Load a model saved by [`GbdtPredictor::save`]
    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        if !path.exists() {
            return Err(PredictorError::MissingModel(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, PredictorError> {
        let model: GBDT = serde_json::from_str(json)?;
        Ok(Self { model })
    }

    pub fn from_trained(model: GBDT) -> Self {
        Self { model }
    }

    /// Write the model as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), PredictorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.model)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Probability that the session was difficult
    pub fn probability(&self, metrics: &InteractionMetrics) -> f64 {
        self.probabilities(std::slice::from_ref(metrics))
            .first()
            .copied()
            .unwrap_or(0.5)
    }

    pub fn probabilities(&self, batch: &[InteractionMetrics]) -> Vec<f64> {
        if batch.is_empty() {
            return Vec::new();
        }
        let data: Vec<Data> = batch
            .iter()
            .map(|m| Data::new_test_data(metrics_to_f32(m), None))
            .collect();
        self.model
            .predict(&data)
            .into_iter()
            .map(|p| (p as f64).clamp(0.0, 1.0))
            .collect()
    }
}

/// Insights explaining a learned verdict, from the raw metrics
pub fn model_insights(m: &InteractionMetrics, is_difficult: bool) -> Vec<String> {
    let mut insights = Vec::new();
    let mut note = |fired: bool, text: &str| {
        if fired {
            insights.push(text.to_string());
        }
    };

    if is_difficult {
        note(m.total_pauses > 5.0, INSIGHT_MANY_PAUSES);
        note(m.pause_median_duration > 30.0, INSIGHT_LONG_PAUSES);
        note(m.replay_ratio > 0.2, INSIGHT_REPLAYED);
        note(m.average_speed < 1.0, INSIGHT_SLOWED);
        note(
            m.skipped_content > 0.0 && m.seek_forward_frequency <= 2.0,
            INSIGHT_GAVE_UP,
        );
    } else {
        note(m.average_speed > 1.25, INSIGHT_SPED_UP);
        note(
            m.seek_forward_frequency > 5.0 && m.skipped_content > 0.0,
            INSIGHT_NAVIGATING,
        );
    }

    if insights.is_empty() {
        insights.push(fallback_insight(is_difficult).to_string());
    }
    insights
}

impl DifficultyPredictor for GbdtPredictor {
    fn name(&self) -> &'static str {
        "learned"
    }

    fn predict(&self, metrics: &InteractionMetrics) -> PredictionResult {
        let p = self.probability(metrics);
        let is_difficult = p >= 0.5;
        let confidence = if is_difficult { p } else { 1.0 - p };

        tracing::debug!(probability = p, is_difficult, "learned verdict");

        PredictionResult {
            predicted_difficulty: u8::from(is_difficult),
            confidence,
            insights: model_insights(metrics, is_difficult),
            difficulty_score: p,
        }
    }
}

/// Boosting parameters
#[derive(Debug, Clone, Copy)]
pub struct GbdtParams {
    pub num_trees: usize,
    pub max_depth: u32,
    pub learning_rate: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            num_trees: 50,
            max_depth: 4,
            learning_rate: 0.1,
        }
    }
}

/// Fit a new ensemble on labelled sessions (`true` = difficult)
pub fn train_gbdt(
    samples: &[(InteractionMetrics, bool)],
    params: &GbdtParams,
) -> Result<GbdtPredictor, PredictorError> {
    if samples.is_empty() {
        return Err(PredictorError::Training(
            "no training samples provided".into(),
        ));
    }

    let mut cfg = Config::new();
    cfg.set_feature_size(crate::features::NUM_FEATURES);
    cfg.set_max_depth(params.max_depth);
    cfg.set_iterations(params.num_trees);
    cfg.set_shrinkage(params.learning_rate as f32);
    cfg.set_loss("LogLikelyhood");
    cfg.set_debug(false);
    cfg.set_training_optimization_level(2);
    cfg.set_min_leaf_size(1);

    let mut gbdt = GBDT::new(&cfg);

    let mut training_data: Vec<Data> = samples
        .iter()
        .map(|(m, difficult)| {
            let label = if *difficult { 1.0_f32 } else { -1.0_f32 };
            Data::new_training_data(metrics_to_f32(m), 1.0_f32, label, None)
        })
        .collect();

    gbdt.fit(&mut training_data);

    Ok(GbdtPredictor::from_trained(gbdt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(pauses: f64, replays: f64, speed: f64) -> InteractionMetrics {
        InteractionMetrics {
            session_duration: 600.0,
            total_pauses: pauses,
            pause_rate: pauses / 10.0,
            replay_frequency: replays,
            average_speed: speed,
            ..Default::default()
        }
    }

    fn toy_samples() -> Vec<(InteractionMetrics, bool)> {
        let mut samples = Vec::new();
        for i in 0..20 {
            let jitter = i as f64 * 0.05;
            samples.push((session(1.0 + jitter, 0.0, 1.5 + jitter), false));
            samples.push((session(10.0 + jitter, 5.0, 0.8 - jitter / 10.0), true));
        }
        samples
    }

    fn small_params() -> GbdtParams {
        GbdtParams {
            num_trees: 20,
            max_depth: 3,
            learning_rate: 0.3,
        }
    }

    #[test]
    fn test_train_and_predict() {
        let model = train_gbdt(&toy_samples(), &small_params()).expect("training should succeed");

        let easy = model.predict(&session(1.2, 0.0, 1.6));
        let hard = model.predict(&session(10.5, 5.0, 0.78));

        assert!(easy.difficulty_score >= 0.0 && easy.difficulty_score <= 1.0);
        assert!(hard.difficulty_score > easy.difficulty_score);
        assert_eq!(hard.predicted_difficulty, 1);
        assert_eq!(easy.predicted_difficulty, 0);
        assert!(hard.confidence >= 0.5 && easy.confidence >= 0.5);
        assert!(!hard.insights.is_empty() && !easy.insights.is_empty());
    }

    #[test]
    fn test_empty_training_set_rejected() {
        assert!(matches!(
            train_gbdt(&[], &GbdtParams::default()),
            Err(PredictorError::Training(_))
        ));
    }

    #[test]
    fn test_save_and_load_preserve_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let model = train_gbdt(&toy_samples(), &small_params()).unwrap();
        model.save(&path).unwrap();

        let loaded = GbdtPredictor::load(&path).unwrap();
        let probe = session(5.0, 2.0, 1.0);
        assert!((model.probability(&probe) - loaded.probability(&probe)).abs() < 1e-6);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "not a model").unwrap();
        assert!(matches!(
            GbdtPredictor::load(&path),
            Err(PredictorError::Json(_))
        ));
    }

    #[test]
    fn test_difficult_insights() {
        let m = InteractionMetrics {
            total_pauses: 8.0,
            pause_median_duration: 45.0,
            replay_ratio: 0.3,
            average_speed: 0.9,
            skipped_content: 20.0,
            seek_forward_frequency: 1.0,
            ..Default::default()
        };
        assert_eq!(
            model_insights(&m, true),
            vec![
                INSIGHT_MANY_PAUSES,
                INSIGHT_LONG_PAUSES,
                INSIGHT_REPLAYED,
                INSIGHT_SLOWED,
                INSIGHT_GAVE_UP
            ]
        );
    }

    #[test]
    fn test_easy_insights_and_fallback() {
        let m = InteractionMetrics {
            average_speed: 1.5,
            seek_forward_frequency: 6.0,
            skipped_content: 90.0,
            ..Default::default()
        };
        assert_eq!(
            model_insights(&m, false),
            vec![INSIGHT_SPED_UP, INSIGHT_NAVIGATING]
        );
        assert_eq!(
            model_insights(&InteractionMetrics::default(), false),
            vec![fallback_insight(false)]
        );
        assert_eq!(
            model_insights(&InteractionMetrics::default(), true),
            vec![fallback_insight(true)]
        );
    }
}
