//! Labelled-session store for incremental updates
//!
//! Each learner report is appended as one JSON line beside the model
//! (`<model>.samples.jsonl`), so the model can be refit on everything
//! collected so far.

use crate::models::LabeledSession;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One stored report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSample {
    #[serde(flatten)]
    pub session: LabeledSession,
    /// RFC 3339 time the report was recorded
    #[serde(default)]
    pub recorded_at: String,
}

/// Append-only JSONL store of labelled sessions
pub struct SampleStore {
    data_path: PathBuf,
}

impl SampleStore {
    /// Store that lives beside a model artifact
    pub fn for_model(model_path: &Path) -> Self {
        let mut name = model_path.as_os_str().to_os_string();
        name.push(".samples.jsonl");
        Self {
            data_path: PathBuf::from(name),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: path.into(),
        }
    }

    pub fn record(&self, session: &LabeledSession) -> std::io::Result<()> {
        if let Some(parent) = self.data_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let sample = StoredSample {
            session: session.clone(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string(&sample)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.data_path)?;

        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// All readable samples; unreadable lines are skipped
    pub fn load_all(&self) -> std::io::Result<Vec<StoredSample>> {
        if !self.data_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.data_path)?);
        let mut samples = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredSample>(&line) {
                Ok(sample) => samples.push(sample),
                Err(e) => tracing::warn!(
                    "Skipping unreadable sample at {}:{}: {}",
                    self.data_path.display(),
                    lineno + 1,
                    e
                ),
            }
        }
        Ok(samples)
    }

    pub fn stats(&self) -> std::io::Result<SampleStats> {
        let samples = self.load_all()?;
        let difficult = samples.iter().filter(|s| s.session.is_difficult()).count();
        Ok(SampleStats {
            total: samples.len(),
            difficult,
            not_difficult: samples.len() - difficult,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleStats {
    pub total: usize,
    pub difficult: usize,
    pub not_difficult: usize,
}

impl SampleStats {
    /// Both classes are present, so a binary model can be fit
    pub fn has_both_labels(&self) -> bool {
        self.difficult > 0 && self.not_difficult > 0
    }
}

impl std::fmt::Display for SampleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples ({} difficult, {} not difficult)",
            self.total, self.difficult, self.not_difficult
        )
    }
}
