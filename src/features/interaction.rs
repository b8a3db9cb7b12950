//! Interaction feature extraction
//!
//! Turns partial client telemetry into a complete [`InteractionMetrics`]
//! record and into the fixed-order vector consumed by the learned model.

use crate::models::{InteractionMetrics, RawInteraction};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Number of features in the model vector
pub const NUM_FEATURES: usize = 11;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "session_duration",
    "total_pauses",
    "pause_rate",
    "pause_median_duration",
    "replay_frequency",
    "replay_duration",
    "replay_ratio",
    "seek_forward_frequency",
    "skipped_content",
    "speed_changes",
    "average_speed",
];

/// Pauses shorter than this are treated as accidental clicks
pub const MIN_PAUSE_SECS: f64 = 2.0;
/// Pauses longer than this mean the learner walked away
pub const MAX_PAUSE_SECS: f64 = 600.0;

/// Floor on the session length used as a divisor, in minutes
const MIN_SESSION_MINUTES: f64 = 0.1;
/// Floor on the session length used as a divisor, in seconds
const MIN_SESSION_SECS: f64 = 0.1;

/// Errors raised while reading unstructured input
#[derive(Error, Debug)]
pub enum InputError {
    #[error("input is not valid UTF-8: {0}")]
    NotUtf8(#[source] std::str::Utf8Error),

    #[error("input is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid field value: {0}")]
    InvalidField(#[source] serde_json::Error),
}

/// Parse a JSON object into `T`, rejecting arrays and scalars.
///
/// serde would otherwise accept a positional array for a struct.
pub fn parse_object<T: DeserializeOwned>(input: &str) -> Result<T, InputError> {
    let value: serde_json::Value = serde_json::from_str(input).map_err(InputError::NotJson)?;
    let kind = match &value {
        serde_json::Value::Object(_) => None,
        serde_json::Value::Null => Some("null"),
        serde_json::Value::Bool(_) => Some("a boolean"),
        serde_json::Value::Number(_) => Some("a number"),
        serde_json::Value::String(_) => Some("a string"),
        serde_json::Value::Array(_) => Some("an array"),
    };
    if let Some(kind) = kind {
        return Err(InputError::NotAnObject(kind));
    }
    serde_json::from_value(value).map_err(InputError::InvalidField)
}

/// Parse raw interaction telemetry from a JSON object
pub fn parse_raw_interaction(input: &str) -> Result<RawInteraction, InputError> {
    parse_object(input)
}

/// Keep finite values, clamping negatives to zero
fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.max(0.0))
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Build a complete metrics record from partial telemetry.
///
/// Absent fields take their defaults (0, or 1.0 for `average_speed`).
/// `pause_rate` and `replay_ratio` are derived when absent. Never fails.
pub fn extract_metrics(raw: &RawInteraction) -> InteractionMetrics {
    let mut total_pauses = sanitize(raw.total_pauses);
    let mut pause_median_duration = sanitize(raw.pause_median_duration);

    if let Some(durations) = &raw.pause_durations {
        let mut valid: Vec<f64> = durations
            .iter()
            .copied()
            .filter(|p| (MIN_PAUSE_SECS..=MAX_PAUSE_SECS).contains(p))
            .collect();
        if !valid.is_empty() {
            if total_pauses.is_none() {
                total_pauses = Some(valid.len() as f64);
            }
            if pause_median_duration.is_none() {
                pause_median_duration = Some(median(&mut valid));
            }
        }
    }

    let session_duration = sanitize(raw.session_duration).unwrap_or(0.0);
    let total_pauses = total_pauses.unwrap_or(0.0);
    let replay_duration = sanitize(raw.replay_duration).unwrap_or(0.0);

    let pause_rate = sanitize(raw.pause_rate).unwrap_or_else(|| {
        total_pauses / (session_duration / 60.0).max(MIN_SESSION_MINUTES)
    });
    let replay_ratio = sanitize(raw.replay_ratio)
        .unwrap_or_else(|| replay_duration / session_duration.max(MIN_SESSION_SECS));

    let average_speed = raw
        .average_speed
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(1.0);

    InteractionMetrics {
        session_duration,
        total_pauses,
        pause_median_duration: pause_median_duration.unwrap_or(0.0),
        replay_frequency: sanitize(raw.replay_frequency).unwrap_or(0.0),
        replay_duration,
        seek_forward_frequency: sanitize(raw.seek_forward_frequency).unwrap_or(0.0),
        skipped_content: sanitize(raw.skipped_content).unwrap_or(0.0),
        speed_changes: sanitize(raw.speed_changes).unwrap_or(0.0),
        average_speed,
        pause_rate,
        replay_ratio,
    }
}

impl InteractionMetrics {
    /// Fixed-order feature vector (see [`FEATURE_NAMES`])
    pub fn to_vector(&self) -> [f64; NUM_FEATURES] {
        [
            self.session_duration,
            self.total_pauses,
            self.pause_rate,
            self.pause_median_duration,
            self.replay_frequency,
            self.replay_duration,
            self.replay_ratio,
            self.seek_forward_frequency,
            self.skipped_content,
            self.speed_changes,
            self.average_speed,
        ]
    }
}

impl From<&RawInteraction> for InteractionMetrics {
    fn from(raw: &RawInteraction) -> Self {
        extract_metrics(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gets_defaults() {
        let m = extract_metrics(&RawInteraction::default());
        assert_eq!(m, InteractionMetrics::default());
        assert_eq!(m.average_speed, 1.0);
    }

    #[test]
    fn test_derives_rates_when_absent() {
        let raw = RawInteraction {
            session_duration: Some(600.0),
            total_pauses: Some(8.0),
            replay_duration: Some(120.0),
            ..Default::default()
        };
        let m = extract_metrics(&raw);
        assert!((m.pause_rate - 0.8).abs() < 1e-9);
        assert!((m.replay_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_uses_floor() {
        let raw = RawInteraction {
            total_pauses: Some(3.0),
            replay_duration: Some(5.0),
            ..Default::default()
        };
        let m = extract_metrics(&raw);
        // 3 pauses over the 0.1-minute floor
        assert!((m.pause_rate - 30.0).abs() < 1e-9);
        assert!((m.replay_ratio - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_derived_values_win() {
        let raw = RawInteraction {
            session_duration: Some(600.0),
            total_pauses: Some(8.0),
            pause_rate: Some(12.0),
            replay_ratio: Some(0.05),
            ..Default::default()
        };
        let m = extract_metrics(&raw);
        assert_eq!(m.pause_rate, 12.0);
        assert_eq!(m.replay_ratio, 0.05);
    }

    #[test]
    fn test_pause_durations_fill_gaps() {
        let raw = RawInteraction {
            session_duration: Some(120.0),
            // 1.0 and 900.0 fall outside the valid window
            pause_durations: Some(vec![1.0, 4.0, 10.0, 30.0, 900.0]),
            ..Default::default()
        };
        let m = extract_metrics(&raw);
        assert_eq!(m.total_pauses, 3.0);
        assert_eq!(m.pause_median_duration, 10.0);
        assert!((m.pause_rate - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_pause_durations_do_not_override_explicit_counts() {
        let raw = RawInteraction {
            total_pauses: Some(7.0),
            pause_median_duration: Some(3.0),
            pause_durations: Some(vec![5.0, 6.0]),
            ..Default::default()
        };
        let m = extract_metrics(&raw);
        assert_eq!(m.total_pauses, 7.0);
        assert_eq!(m.pause_median_duration, 3.0);
    }

    #[test]
    fn test_negative_and_nonfinite_values_are_sanitized() {
        let raw = RawInteraction {
            session_duration: Some(-5.0),
            replay_frequency: Some(f64::NAN),
            average_speed: Some(0.0),
            ..Default::default()
        };
        let m = extract_metrics(&raw);
        assert_eq!(m.session_duration, 0.0);
        assert_eq!(m.replay_frequency, 0.0);
        assert_eq!(m.average_speed, 1.0);
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(matches!(
            parse_raw_interaction("[600, 8]"),
            Err(InputError::NotAnObject("an array"))
        ));
        assert!(matches!(
            parse_raw_interaction("not json"),
            Err(InputError::NotJson(_))
        ));
        assert!(matches!(
            parse_raw_interaction(r#"{"total_pauses": "many"}"#),
            Err(InputError::InvalidField(_))
        ));
        assert!(parse_raw_interaction(r#"{"total_pauses": 4}"#).is_ok());
    }

    #[test]
    fn test_vector_order_matches_names() {
        let m = InteractionMetrics {
            session_duration: 1.0,
            total_pauses: 2.0,
            pause_rate: 3.0,
            pause_median_duration: 4.0,
            replay_frequency: 5.0,
            replay_duration: 6.0,
            replay_ratio: 7.0,
            seek_forward_frequency: 8.0,
            skipped_content: 9.0,
            speed_changes: 10.0,
            average_speed: 11.0,
        };
        let v = m.to_vector();
        for (i, value) in v.iter().enumerate() {
            assert_eq!(*value, (i + 1) as f64, "feature {} out of order", FEATURE_NAMES[i]);
        }
    }
}
