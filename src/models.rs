//! Core data models for difficulty-detector
//!
//! These models are shared by the feature extractors, both predictors,
//! the CLI bridge and the HTTP gateway.

use serde::{Deserialize, Serialize};

/// Raw interaction telemetry as received from a client.
///
/// Every field is optional; unknown fields are ignored. Turning this into
/// an [`InteractionMetrics`] is the job of [`crate::features::extract_metrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInteraction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pauses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_median_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seek_forward_frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_changes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_ratio: Option<f64>,
    /// Individual pause lengths in seconds, when the client tracks them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_durations: Option<Vec<f64>>,
}

/// A complete, validated record of one learning session.
///
/// Counts are carried as `f64` because clients aggregate them over
/// several views and may send fractional values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionMetrics {
    /// Seconds spent on the video
    pub session_duration: f64,
    pub total_pauses: f64,
    /// Median pause length in seconds
    pub pause_median_duration: f64,
    pub replay_frequency: f64,
    /// Seconds spent re-watching
    pub replay_duration: f64,
    pub seek_forward_frequency: f64,
    /// Seconds of content skipped
    pub skipped_content: f64,
    pub speed_changes: f64,
    /// Mean playback rate (1.0 = normal speed)
    pub average_speed: f64,
    /// Pauses per minute
    pub pause_rate: f64,
    /// Fraction of the session spent replaying
    pub replay_ratio: f64,
}

impl Default for InteractionMetrics {
    fn default() -> Self {
        Self {
            session_duration: 0.0,
            total_pauses: 0.0,
            pause_median_duration: 0.0,
            replay_frequency: 0.0,
            replay_duration: 0.0,
            seek_forward_frequency: 0.0,
            skipped_content: 0.0,
            speed_changes: 0.0,
            average_speed: 1.0,
            pause_rate: 0.0,
            replay_ratio: 0.0,
        }
    }
}

/// Output of a difficulty prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 = difficult, 0 = not difficult
    pub predicted_difficulty: u8,
    pub confidence: f64,
    /// Human-readable explanations, never empty
    pub insights: Vec<String>,
    /// Raw score behind the decision (heuristic score or model probability)
    pub difficulty_score: f64,
}

impl PredictionResult {
    pub fn is_difficult(&self) -> bool {
        self.predicted_difficulty == 1
    }
}

/// Degraded-but-valid result returned when the input could not be read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub predicted_difficulty: u8,
    pub confidence: f64,
    pub error: String,
    pub insights: Vec<String>,
}

impl PredictionFailure {
    pub const INSIGHT: &'static str = "Error in difficulty prediction";

    pub fn new(error: impl Into<String>) -> Self {
        Self {
            predicted_difficulty: 0,
            confidence: 0.5,
            error: error.into(),
            insights: vec![Self::INSIGHT.to_string()],
        }
    }
}

/// Either a prediction or a structured failure; serialises to the bare
/// object of whichever variant it holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Success(PredictionResult),
    Failure(PredictionFailure),
}

impl PredictionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PredictionOutcome::Failure(_))
    }
}

/// A session labelled by the learner, used for training and updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledSession {
    #[serde(flatten)]
    pub metrics: RawInteraction,
    /// Non-zero means the learner reported the content as difficult
    #[serde(default)]
    pub reported_difficulty: u8,
}

impl LabeledSession {
    pub fn new(metrics: RawInteraction, difficult: bool) -> Self {
        Self {
            metrics,
            reported_difficulty: u8::from(difficult),
        }
    }

    pub fn is_difficult(&self) -> bool {
        self.reported_difficulty != 0
    }
}

/// Closed label set of the code-answer classifier.
///
/// Declaration order is the class index used by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLabel {
    #[serde(rename = "Incomplete Answer")]
    IncompleteAnswer,
    #[serde(rename = "Syntax Error")]
    SyntaxError,
    #[serde(rename = "correct")]
    Correct,
}

impl AnswerLabel {
    pub const ALL: [AnswerLabel; 3] = [
        AnswerLabel::IncompleteAnswer,
        AnswerLabel::SyntaxError,
        AnswerLabel::Correct,
    ];

    pub fn index(self) -> usize {
        match self {
            AnswerLabel::IncompleteAnswer => 0,
            AnswerLabel::SyntaxError => 1,
            AnswerLabel::Correct => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLabel::IncompleteAnswer => "Incomplete Answer",
            AnswerLabel::SyntaxError => "Syntax Error",
            AnswerLabel::Correct => "correct",
        }
    }

    /// Parse a dataset label, ignoring case and surrounding whitespace
    pub fn parse(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(wanted))
    }
}

impl std::fmt::Display for AnswerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code answer submitted for classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeSubmission {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub input_text: String,
    #[serde(default)]
    pub user_answer: String,
}
