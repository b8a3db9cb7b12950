//! Softmax regression over TF-IDF and code features
//!
//! Architecture: merged text -> TF-IDF, answer code -> 8 static features,
//! concatenated -> Linear(3) -> Softmax. Trained with seeded SGD so the
//! same data always produces the same artifact.

use super::tfidf::TfidfVectorizer;
use super::AnswerError;
use crate::features::{merged_text, CodeFeatures, NUM_CODE_FEATURES};
use crate::models::{AnswerLabel, CodeSubmission};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

const NUM_CLASSES: usize = 3;

/// SGD hyperparameters
#[derive(Debug, Clone, Copy)]
pub struct SgdConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    /// L2 penalty applied to the weights (not the bias)
    pub l2: f32,
    pub seed: u64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            epochs: 40,
            learning_rate: 0.5,
            l2: 1e-4,
            seed: 42,
        }
    }
}

/// Result of classifying one submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerPrediction {
    pub label: AnswerLabel,
    /// Class probabilities in [`AnswerLabel::ALL`] order
    pub probabilities: [f32; NUM_CLASSES],
}

/// Numeric code features, with line counts log-scaled to the range of
/// the TF-IDF weights
fn scaled_code_features(code: &str) -> [f32; NUM_CODE_FEATURES] {
    let mut v = CodeFeatures::extract(code).to_vector();
    v[1] = v[1].ln_1p();
    v
}

fn softmax(logits: [f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut exps = logits.map(|l| (l - max).exp());
    let sum: f32 = exps.iter().sum();
    for e in &mut exps {
        *e /= sum;
    }
    exps
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerClassifier {
    vectorizer: TfidfVectorizer,
    /// [NUM_CLASSES x input_size]
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    input_size: usize,
}

impl AnswerClassifier {
    /// Input vector: TF-IDF of the merged text, then the code features
    /// of the answer
    pub fn features(&self, submission: &CodeSubmission) -> Vec<f32> {
        let mut v = self.vectorizer.transform(&merged_text(submission));
        v.extend_from_slice(&scaled_code_features(&submission.user_answer));
        v
    }

    fn logits(&self, x: &[f32]) -> [f32; NUM_CLASSES] {
        let mut logits = [0.0_f32; NUM_CLASSES];
        for (k, logit) in logits.iter_mut().enumerate() {
            let dot: f32 = self.weights[k].iter().zip(x).map(|(w, v)| w * v).sum();
            *logit = self.bias[k] + dot;
        }
        logits
    }

    fn probabilities(&self, x: &[f32]) -> [f32; NUM_CLASSES] {
        softmax(self.logits(x))
    }

    pub fn predict(&self, submission: &CodeSubmission) -> AnswerPrediction {
        let probabilities = self.probabilities(&self.features(submission));
        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        AnswerPrediction {
            label: AnswerLabel::from_index(best).unwrap_or(AnswerLabel::IncompleteAnswer),
            probabilities,
        }
    }

    /// Fit the vectorizer and weights on labelled submissions
    pub fn fit(
        examples: &[(CodeSubmission, AnswerLabel)],
        config: &SgdConfig,
    ) -> Result<Self, AnswerError> {
        if examples.is_empty() {
            return Err(AnswerError::Training("no labelled answers provided".into()));
        }

        let texts: Vec<String> = examples.iter().map(|(s, _)| merged_text(s)).collect();
        let vectorizer = TfidfVectorizer::fit(&texts);
        let input_size = vectorizer.vocabulary_size() + NUM_CODE_FEATURES;

        let mut model = Self {
            vectorizer,
            weights: vec![vec![0.0; input_size]; NUM_CLASSES],
            bias: vec![0.0; NUM_CLASSES],
            input_size,
        };

        // tree-sitter parsing dominates; extract in parallel
        let inputs: Vec<(Vec<f32>, usize)> = examples
            .par_iter()
            .map(|(s, label)| (model.features(s), label.index()))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..inputs.len()).collect();
        for epoch in 0..config.epochs {
            order.shuffle(&mut rng);
            let lr = config.learning_rate / (1.0 + epoch as f32 * 0.1);
            let mut loss = 0.0_f32;
            for &i in &order {
                let (x, target) = &inputs[i];
                loss += model.sgd_step(x, *target, lr, config.l2);
            }
            if epoch % 10 == 0 || epoch + 1 == config.epochs {
                tracing::debug!(
                    "Epoch {}/{}: loss={:.4}",
                    epoch + 1,
                    config.epochs,
                    loss / inputs.len() as f32
                );
            }
        }

        Ok(model)
    }

    /// One cross-entropy gradient step; returns the sample loss
    fn sgd_step(&mut self, x: &[f32], target: usize, lr: f32, l2: f32) -> f32 {
        let probs = self.probabilities(x);
        let loss = -probs[target].max(1e-7).ln();

        let mut d_logits = probs;
        d_logits[target] -= 1.0;

        for (k, grad) in d_logits.iter().enumerate() {
            self.bias[k] -= lr * grad;
            for (w, &v) in self.weights[k].iter_mut().zip(x) {
                *w -= lr * (grad * v + l2 * *w);
            }
        }
        loss
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn load(path: &Path) -> Result<Self, AnswerError> {
        if !path.exists() {
            return Err(AnswerError::MissingModel(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        if model.weights.len() != NUM_CLASSES
            || model.weights.iter().any(|row| row.len() != model.input_size)
            || model.bias.len() != NUM_CLASSES
        {
            return Err(AnswerError::Training(format!(
                "model at {} has inconsistent dimensions",
                path.display()
            )));
        }
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), AnswerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}
