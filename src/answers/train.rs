//! Training data and evaluation for the answer classifier

use super::model::{AnswerClassifier, SgdConfig};
use super::AnswerError;
use crate::models::{AnswerLabel, CodeSubmission};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One dataset row; `answer_type` is the label
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRecord {
    #[serde(flatten)]
    pub submission: CodeSubmission,
    #[serde(default)]
    pub answer_type: Option<String>,
}

/// Read labelled answers from a JSONL file.
///
/// Rows without a label, or with a label outside the known set, are
/// skipped. A line that is not JSON is an error.
pub fn load_examples(path: &Path) -> Result<Vec<(CodeSubmission, AnswerLabel)>, AnswerError> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut examples = Vec::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: AnswerRecord = serde_json::from_str(&line)?;
        match record.answer_type.as_deref().and_then(AnswerLabel::parse) {
            Some(label) => examples.push((record.submission, label)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} rows without a known answer_type", skipped);
    }
    Ok(examples)
}

/// Per-label precision and recall on the hold-out set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: AnswerLabel,
    pub precision: f64,
    pub recall: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerReport {
    pub accuracy: f64,
    pub labels: Vec<LabelScore>,
    /// `confusion[actual][predicted]` in [`AnswerLabel::ALL`] order
    pub confusion: [[usize; 3]; 3],
    pub train_samples: usize,
    pub test_samples: usize,
}

impl AnswerReport {
    pub fn from_predictions(
        pairs: &[(AnswerLabel, AnswerLabel)],
        train_samples: usize,
    ) -> Self {
        let mut confusion = [[0usize; 3]; 3];
        for (actual, predicted) in pairs {
            confusion[actual.index()][predicted.index()] += 1;
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let labels = AnswerLabel::ALL
            .iter()
            .map(|&label| {
                let i = label.index();
                let predicted: usize = (0..3).map(|a| confusion[a][i]).sum();
                let support: usize = confusion[i].iter().sum();
                LabelScore {
                    label,
                    precision: ratio(confusion[i][i], predicted),
                    recall: ratio(confusion[i][i], support),
                    support,
                }
            })
            .collect();

        let correct: usize = (0..3).map(|i| confusion[i][i]).sum();
        Self {
            accuracy: ratio(correct, pairs.len()),
            labels,
            confusion,
            train_samples,
            test_samples: pairs.len(),
        }
    }
}

impl std::fmt::Display for AnswerReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Accuracy: {:.3} (train={}, test={})",
            self.accuracy, self.train_samples, self.test_samples
        )?;
        writeln!(f, "{:<20} {:>9} {:>9} {:>8}", "label", "precision", "recall", "support")?;
        for s in &self.labels {
            writeln!(
                f,
                "{:<20} {:>9.3} {:>9.3} {:>8}",
                s.label.as_str(),
                s.precision,
                s.recall,
                s.support
            )?;
        }
        writeln!(f, "\nConfusion matrix (rows = actual, columns = predicted):")?;
        for (label, row) in AnswerLabel::ALL.iter().zip(&self.confusion) {
            writeln!(f, "{:<20} {:>6} {:>6} {:>6}", label.as_str(), row[0], row[1], row[2])?;
        }
        Ok(())
    }
}

/// Hold out `test_fraction` of each label, fit on the rest and report
pub fn train_answers(
    examples: &[(CodeSubmission, AnswerLabel)],
    test_fraction: f64,
    config: &SgdConfig,
) -> Result<(AnswerClassifier, AnswerReport), AnswerError> {
    if examples.is_empty() {
        return Err(AnswerError::Training("no labelled answers found".into()));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut train_set = Vec::new();
    let mut test_set = Vec::new();

    for label in AnswerLabel::ALL {
        let mut class: Vec<&(CodeSubmission, AnswerLabel)> =
            examples.iter().filter(|(_, l)| *l == label).collect();
        class.shuffle(&mut rng);
        let held = ((class.len() as f64 * fraction).round() as usize)
            .min(class.len().saturating_sub(1));
        for (i, example) in class.into_iter().enumerate() {
            if i < held {
                test_set.push(example.clone());
            } else {
                train_set.push(example.clone());
            }
        }
    }

    tracing::info!(
        "Training answer classifier: {} answers, {} held out",
        train_set.len(),
        test_set.len()
    );

    let model = AnswerClassifier::fit(&train_set, config)?;

    // Without a hold-out set, report in-sample figures
    let eval_set = if test_set.is_empty() { &train_set } else { &test_set };
    let pairs: Vec<(AnswerLabel, AnswerLabel)> = eval_set
        .iter()
        .map(|(s, actual)| (*actual, model.predict(s).label))
        .collect();

    let report = AnswerReport::from_predictions(&pairs, train_set.len());
    Ok((model, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_examples_skips_unlabelled_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"instruction": "Add", "input_text": "", "user_answer": "return a + b", "answer_type": "correct"}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"instruction": "Add", "user_answer": "x", "answer_type": "Partially right"}}"#).unwrap();
        writeln!(file, r#"{{"instruction": "Add", "user_answer": "y"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"user_answer": "def f(:", "answer_type": "Syntax Error"}}"#).unwrap();

        let examples = load_examples(file.path()).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].1, AnswerLabel::Correct);
        assert_eq!(examples[1].1, AnswerLabel::SyntaxError);
        assert_eq!(examples[1].0.instruction, "");
    }

    #[test]
    fn test_load_examples_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(matches!(
            load_examples(file.path()),
            Err(AnswerError::Json(_))
        ));
    }

    #[test]
    fn test_report_from_predictions() {
        use AnswerLabel::*;
        let pairs = [
            (Correct, Correct),
            (Correct, SyntaxError),
            (SyntaxError, SyntaxError),
            (IncompleteAnswer, IncompleteAnswer),
        ];
        let report = AnswerReport::from_predictions(&pairs, 10);
        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.confusion[Correct.index()][SyntaxError.index()], 1);

        let syntax = &report.labels[SyntaxError.index()];
        assert_eq!(syntax.precision, 0.5);
        assert_eq!(syntax.recall, 1.0);
        let correct = &report.labels[Correct.index()];
        assert_eq!(correct.precision, 1.0);
        assert_eq!(correct.recall, 0.5);
        assert_eq!(correct.support, 2);

        let text = report.to_string();
        assert!(text.contains("Syntax Error"));
        assert!(text.contains("Confusion matrix"));
    }

    #[test]
    fn test_train_answers_holds_out_each_label() {
        let mut examples = Vec::new();
        for i in 0..5 {
            let name = format!("f{}", i);
            examples.push((
                CodeSubmission {
                    instruction: "Write a function".into(),
                    input_text: String::new(),
                    user_answer: format!("def {}(x):\n    return x", name),
                },
                AnswerLabel::Correct,
            ));
            examples.push((
                CodeSubmission {
                    instruction: "Write a function".into(),
                    input_text: String::new(),
                    user_answer: format!("def {}(x:\n    return x", name),
                },
                AnswerLabel::SyntaxError,
            ));
            examples.push((
                CodeSubmission {
                    instruction: "Write a function".into(),
                    input_text: String::new(),
                    user_answer: format!("def {}(x):\n    pass", name),
                },
                AnswerLabel::IncompleteAnswer,
            ));
        }

        let (_, report) = train_answers(&examples, 0.2, &SgdConfig::default()).unwrap();
        assert_eq!(report.test_samples, 3);
        assert_eq!(report.train_samples, 12);
        assert!(report.labels.iter().all(|s| s.support == 1));
    }
}
