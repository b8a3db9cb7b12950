//! Rule-based difficulty scorer
//!
//! Encodes what in-video behaviour says about perceived difficulty:
//! frequent pauses, replays and slowed playback point to difficulty, fast
//! playback and large forward skips point to familiarity.
//!
//! Each rule adds to a running score; positive means difficult. The score
//! magnitude sets the confidence. Two override rules then force a
//! difficult verdict for unambiguous patterns.

use super::{fallback_insight, DifficultyPredictor};
use crate::models::{InteractionMetrics, PredictionResult};

pub const INSIGHT_HIGH_PAUSES: &str = "High frequency of pauses suggests difficulty with content";
pub const INSIGHT_MANY_REPLAYS: &str = "Multiple content replays suggest challenging concepts";
pub const INSIGHT_SOME_REPLAYS: &str =
    "Content was replayed, suggesting review of challenging sections";
pub const INSIGHT_REPLAY_TIME: &str =
    "Significant time spent rewatching content indicates difficulty";
pub const INSIGHT_FAST_PLAYBACK: &str =
    "Increased playback speed suggests comfortable understanding";
pub const INSIGHT_SLOW_PLAYBACK: &str = "Reduced playback speed suggests content is challenging";
pub const INSIGHT_SKIPPING: &str = "Skipping forward suggests familiarity with content";

/// Confidence for replays combined with very frequent pausing
pub const REPLAY_PAUSE_OVERRIDE_CONFIDENCE: f64 = 0.9;
/// Confidence for a short session with many pauses
pub const SHORT_SESSION_OVERRIDE_CONFIDENCE: f64 = 0.85;

/// Accumulated evidence for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifficultyScore {
    pub value: f64,
    pub insights: Vec<String>,
}

impl DifficultyScore {
    fn add(&mut self, delta: f64, insight: Option<&str>) {
        self.value += delta;
        if let Some(text) = insight {
            self.insights.push(text.to_string());
        }
    }

    /// `0.5` at zero evidence, rising by 0.1 per point up to 0.95
    pub fn confidence(&self) -> f64 {
        0.5 + (self.value.abs() * 0.1).min(0.45)
    }
}

/// Deterministic rule evaluator; holds no state
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor;

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the scoring rules in order
    pub fn score(&self, m: &InteractionMetrics) -> DifficultyScore {
        let mut score = DifficultyScore::default();

        // Pausing
        if m.pause_rate > 10.0 {
            score.add(3.0, Some(INSIGHT_HIGH_PAUSES));
        } else if m.pause_rate > 5.0 {
            score.add(1.5, None);
        }

        // Replays
        if m.replay_frequency > 3.0 {
            score.add(3.0, Some(INSIGHT_MANY_REPLAYS));
        } else if m.replay_frequency > 0.0 {
            score.add(1.5, Some(INSIGHT_SOME_REPLAYS));
        }

        if m.replay_ratio > 0.2 {
            score.add(2.0, Some(INSIGHT_REPLAY_TIME));
        }

        // Fast playback is only weak evidence of ease; slow playback is strong
        // evidence of difficulty.
        if m.average_speed > 1.5 {
            score.add(-0.5, Some(INSIGHT_FAST_PLAYBACK));
        } else if m.average_speed < 0.9 {
            score.add(2.0, Some(INSIGHT_SLOW_PLAYBACK));
        }

        // Only skipping a large share of the session counts
        if m.seek_forward_frequency > 3.0 && m.skipped_content > m.session_duration * 0.3 {
            score.add(-1.0, Some(INSIGHT_SKIPPING));
        }

        score
    }

    /// Turn a score into a verdict, applying the override rules.
    ///
    /// Overrides run in a fixed order and the later one's confidence wins
    /// when both fire.
    pub fn classify(&self, m: &InteractionMetrics, score: DifficultyScore) -> PredictionResult {
        let mut is_difficult = score.value > 0.0;
        let mut confidence = score.confidence();

        if m.replay_frequency > 2.0 && m.pause_rate > 10.0 {
            is_difficult = true;
            confidence = REPLAY_PAUSE_OVERRIDE_CONFIDENCE;
        }

        if m.session_duration < 60.0 && m.pause_rate > 8.0 {
            is_difficult = true;
            confidence = SHORT_SESSION_OVERRIDE_CONFIDENCE;
        }

        let DifficultyScore { value, mut insights } = score;
        if insights.is_empty() {
            insights.push(fallback_insight(is_difficult).to_string());
        }

        tracing::debug!(
            difficulty_score = value,
            is_difficult,
            confidence,
            replay_frequency = m.replay_frequency,
            pause_rate = m.pause_rate,
            "heuristic verdict"
        );

        PredictionResult {
            predicted_difficulty: u8::from(is_difficult),
            confidence,
            insights,
            difficulty_score: value,
        }
    }
}

impl DifficultyPredictor for HeuristicPredictor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn predict(&self, metrics: &InteractionMetrics) -> PredictionResult {
        let score = self.score(metrics);
        self.classify(metrics, score)
    }
}
