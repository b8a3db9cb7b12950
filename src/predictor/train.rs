//! Training for the learned predictor
//!
//! Full training shuffles labelled sessions with a seeded RNG, holds out a
//! stratified test fraction, fits the ensemble and reports hold-out
//! metrics. Refitting (after an incremental update) uses every stored
//! sample and reports in-sample metrics.

use super::gbdt_model::{train_gbdt, GbdtParams, GbdtPredictor};
use super::PredictorError;
use crate::features::extract_metrics;
use crate::models::{InteractionMetrics, LabeledSession};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub params: GbdtParams,
    /// Fraction of each class held out for evaluation (0.0 - 1.0)
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            params: GbdtParams::default(),
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Binary classification metrics, "difficult" being the positive class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub train_samples: usize,
    pub test_samples: usize,
}

impl std::fmt::Display for TrainMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "accuracy={:.3} precision={:.3} recall={:.3} f1={:.3} (train={}, test={})",
            self.accuracy,
            self.precision,
            self.recall,
            self.f1,
            self.train_samples,
            self.test_samples
        )
    }
}

type Sample = (InteractionMetrics, bool);

fn to_samples(sessions: &[LabeledSession]) -> Vec<Sample> {
    sessions
        .iter()
        .map(|s| (extract_metrics(&s.metrics), s.is_difficult()))
        .collect()
}

fn check_labels(samples: &[Sample]) -> Result<(), PredictorError> {
    let difficult = samples.iter().filter(|(_, d)| *d).count();
    if difficult == 0 || difficult == samples.len() {
        return Err(PredictorError::Training(format!(
            "need both difficult and non-difficult sessions, got {} of {} difficult",
            difficult,
            samples.len()
        )));
    }
    Ok(())
}

/// Shuffle each class with `seed` and hold out `test_fraction` of it.
///
/// Each class keeps at least one training sample; a class of one is never
/// held out.
pub fn stratified_split<T: Clone>(
    items: &[(T, bool)],
    test_fraction: f64,
    seed: u64,
) -> (Vec<(T, bool)>, Vec<(T, bool)>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut train_set = Vec::new();
    let mut test_set = Vec::new();

    for label in [false, true] {
        let mut class: Vec<(T, bool)> = items
            .iter()
            .filter(|(_, l)| *l == label)
            .cloned()
            .collect();
        class.shuffle(&mut rng);
        let held = ((class.len() as f64 * fraction).round() as usize)
            .min(class.len().saturating_sub(1));
        let rest = class.split_off(held);
        test_set.extend(class);
        train_set.extend(rest);
    }

    train_set.shuffle(&mut rng);
    test_set.shuffle(&mut rng);
    (train_set, test_set)
}

/// Score a model against labelled samples
pub fn evaluate(model: &GbdtPredictor, samples: &[Sample]) -> (f64, f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let batch: Vec<InteractionMetrics> = samples.iter().map(|(m, _)| *m).collect();
    let probs = model.probabilities(&batch);

    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for (p, (_, actual)) in probs.iter().zip(samples) {
        match (*p >= 0.5, *actual) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let accuracy = ratio(tp + tn, samples.len());
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (accuracy, precision, recall, f1)
}

/// Train on labelled sessions with a held-out evaluation split
pub fn train(
    sessions: &[LabeledSession],
    config: &TrainConfig,
) -> Result<(GbdtPredictor, TrainMetrics), PredictorError> {
    let samples = to_samples(sessions);
    if samples.len() < 2 {
        return Err(PredictorError::Training(format!(
            "need at least 2 labelled sessions, found {}",
            samples.len()
        )));
    }
    check_labels(&samples)?;

    let (train_set, test_set) = stratified_split(&samples, config.test_fraction, config.seed);
    tracing::info!(
        "Training: {} sessions, Test: {} sessions",
        train_set.len(),
        test_set.len()
    );

    let model = train_gbdt(&train_set, &config.params)?;

    // Without a hold-out set, report in-sample figures
    let eval_set = if test_set.is_empty() { &train_set } else { &test_set };
    let (accuracy, precision, recall, f1) = evaluate(&model, eval_set);

    let metrics = TrainMetrics {
        accuracy,
        precision,
        recall,
        f1,
        train_samples: train_set.len(),
        test_samples: test_set.len(),
    };
    tracing::info!("Trained learned predictor: {}", metrics);
    Ok((model, metrics))
}

/// Fit on every sample with no hold-out; metrics are in-sample
pub fn refit(
    sessions: &[LabeledSession],
    params: &GbdtParams,
) -> Result<(GbdtPredictor, TrainMetrics), PredictorError> {
    let samples = to_samples(sessions);
    check_labels(&samples)?;

    let model = train_gbdt(&samples, params)?;
    let (accuracy, precision, recall, f1) = evaluate(&model, &samples);
    Ok((
        model,
        TrainMetrics {
            accuracy,
            precision,
            recall,
            f1,
            train_samples: samples.len(),
            test_samples: 0,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::synthetic;

    fn quick_config() -> TrainConfig {
        TrainConfig {
            params: GbdtParams {
                num_trees: 20,
                max_depth: 3,
                learning_rate: 0.3,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_split_is_stratified_and_deterministic() {
        let items: Vec<(usize, bool)> = (0..50).map(|i| (i, i % 5 == 0)).collect();
        let (train_a, test_a) = stratified_split(&items, 0.2, 42);
        let (train_b, test_b) = stratified_split(&items, 0.2, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        assert_eq!(test_a.len(), 10);
        assert_eq!(test_a.iter().filter(|(_, l)| *l).count(), 2);
        assert_eq!(train_a.len() + test_a.len(), 50);
    }

    #[test]
    fn test_split_keeps_a_training_sample_per_class() {
        let items = vec![(1, true), (2, false)];
        let (train_set, test_set) = stratified_split(&items, 0.9, 1);
        assert_eq!(train_set.len(), 2);
        assert!(test_set.is_empty());
    }

    #[test]
    fn test_train_on_synthetic_data() {
        let sessions = synthetic::generate(100, 42);
        let (model, metrics) = train(&sessions, &quick_config()).unwrap();
        assert_eq!(metrics.train_samples, 80);
        assert_eq!(metrics.test_samples, 20);
        // The synthetic classes barely overlap
        assert!(metrics.accuracy >= 0.9, "accuracy {}", metrics.accuracy);

        let hard = extract_metrics(&sessions[99].metrics);
        let easy = extract_metrics(&sessions[0].metrics);
        assert!(model.probability(&hard) > model.probability(&easy));
    }

    #[test]
    fn test_single_label_rejected() {
        let sessions: Vec<LabeledSession> = synthetic::generate(10, 1)
            .into_iter()
            .filter(|s| s.is_difficult())
            .collect();
        assert!(matches!(
            train(&sessions, &quick_config()),
            Err(PredictorError::Training(_))
        ));
        assert!(refit(&sessions, &quick_config().params).is_err());
    }

    #[test]
    fn test_refit_reports_in_sample() {
        let sessions = synthetic::generate(20, 3);
        let (_, metrics) = refit(&sessions, &quick_config().params).unwrap();
        assert_eq!(metrics.train_samples, 20);
        assert_eq!(metrics.test_samples, 0);
        assert!(metrics.accuracy > 0.5);
    }

    #[test]
    fn test_evaluate_empty() {
        let model = train_gbdt(
            &to_samples(&synthetic::generate(10, 5)),
            &quick_config().params,
        )
        .unwrap();
        assert_eq!(evaluate(&model, &[]), (0.0, 0.0, 0.0, 0.0));
    }
}
