//! Code-answer classifier
//!
//! Labels a submitted answer as "Incomplete Answer", "Syntax Error" or
//! "correct" from the exercise text and the static features of the code.
//!
//! Architecture: TF-IDF(merged text) + code features -> softmax regression

pub mod model;
pub mod tfidf;
pub mod train;

pub use model::{AnswerClassifier, AnswerPrediction, SgdConfig};
pub use tfidf::TfidfVectorizer;
pub use train::{load_examples, train_answers, AnswerReport, LabelScore};

use crate::features::{parse_object, InputError};
use crate::models::CodeSubmission;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("answer model not found: {}", .0.display())]
    MissingModel(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid submission: {0}")]
    Input(#[from] InputError),

    #[error("training failed: {0}")]
    Training(String),
}

/// Classify a raw JSON submission
pub fn classify_json(
    classifier: &AnswerClassifier,
    input: &str,
) -> Result<AnswerPrediction, AnswerError> {
    let submission: CodeSubmission = parse_object(input)?;
    Ok(classifier.predict(&submission))
}
