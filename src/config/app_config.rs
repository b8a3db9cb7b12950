//! Configuration for difficulty-detector
//!
//! Supports loading config from:
//! - An explicit `--config` file, or `<config_dir>/difficulty-detector/config.toml`
//! - Environment variables (`DIFFICULTY_DETECTOR_*`), which win

use crate::predictor::{GbdtParams, PredictorKind, TrainConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREDICTOR: &str = "DIFFICULTY_DETECTOR_PREDICTOR";
pub const ENV_MODEL: &str = "DIFFICULTY_DETECTOR_MODEL";
pub const ENV_ANSWER_MODEL: &str = "DIFFICULTY_DETECTOR_ANSWER_MODEL";
pub const ENV_PORT: &str = "DIFFICULTY_DETECTOR_PORT";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub predictor: PredictorSection,
    #[serde(default)]
    pub answers: AnswersSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub training: TrainingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PredictorSection {
    /// "heuristic" (default) or "learned"
    #[serde(default)]
    pub kind: PredictorKind,
    /// Learned model artifact
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnswersSection {
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainingSection {
    pub seed: u64,
    /// Sessions generated when training without a data file
    pub synthetic_samples: usize,
    pub test_fraction: f64,
    pub num_trees: usize,
    pub max_depth: u32,
    pub learning_rate: f64,
}

impl Default for TrainingSection {
    fn default() -> Self {
        let params = GbdtParams::default();
        Self {
            seed: 42,
            synthetic_samples: 1000,
            test_fraction: 0.2,
            num_trees: params.num_trees,
            max_depth: params.max_depth,
            learning_rate: params.learning_rate,
        }
    }
}

impl TrainingSection {
    pub fn gbdt_params(&self) -> GbdtParams {
        GbdtParams {
            num_trees: self.num_trees,
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
        }
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            params: self.gbdt_params(),
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }
}

impl AppConfig {
    /// Load config, with priority:
    /// 1. Environment variables (highest)
    /// 2. `explicit` file, or the user config file when it exists
    /// 3. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::user_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `DIFFICULTY_DETECTOR_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(kind) = lookup(ENV_PREDICTOR) {
            self.predictor.kind = kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{}: {}", ENV_PREDICTOR, e))?;
        }
        if let Some(path) = lookup(ENV_MODEL) {
            self.predictor.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_ANSWER_MODEL) {
            self.answers.model_path = Some(PathBuf::from(path));
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.training;
        if !(0.0..1.0).contains(&t.test_fraction) {
            anyhow::bail!(
                "training.test_fraction must be in [0, 1), got {}",
                t.test_fraction
            );
        }
        if t.num_trees == 0 || t.max_depth == 0 {
            anyhow::bail!("training.num_trees and training.max_depth must be positive");
        }
        if !t.learning_rate.is_finite() || t.learning_rate <= 0.0 {
            anyhow::bail!(
                "training.learning_rate must be positive, got {}",
                t.learning_rate
            );
        }
        Ok(())
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("difficulty-detector").join("config.toml"))
    }

    /// Write the commented example config to `path` (or the user config
    /// path) unless a file is already there
    pub fn init(path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::user_config_path()
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
        };

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if !config_path.exists() {
            std::fs::write(&config_path, EXAMPLE_CONFIG)?;
        }

        Ok(config_path)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

const EXAMPLE_CONFIG: &str = r#"# difficulty-detector configuration
# Environment variables DIFFICULTY_DETECTOR_PREDICTOR, _MODEL, _ANSWER_MODEL
# and _PORT override the values below.

[predictor]
# "heuristic" (rule-based, no artifact) or "learned" (needs model_path)
# kind = "heuristic"
# model_path = "models/difficulty.json"

[answers]
# Answer classifier artifact produced by `difficulty-detector train-answers`
# model_path = "models/answers.json"

[server]
# host = "127.0.0.1"
# port = 8000

[training]
# seed = 42
# synthetic_samples = 1000
# test_fraction = 0.2
# num_trees = 50
# max_depth = 4
# learning_rate = 0.1
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.predictor.kind, PredictorKind::Heuristic);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.test_fraction, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
[predictor]
kind = "learned"
model_path = "models/difficulty.json"

[server]
port = 9000

[training]
num_trees = 10
"#,
        )
        .unwrap();
        assert_eq!(config.predictor.kind, PredictorKind::Learned);
        assert_eq!(
            config.predictor.model_path.as_deref(),
            Some(Path::new("models/difficulty.json"))
        );
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.training.num_trees, 10);
        assert_eq!(config.training.seed, 42);
    }

    #[test]
    fn test_toml_parsing_minimal() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_unknown_predictor_kind_rejected() {
        assert!(toml::from_str::<AppConfig>("[predictor]\nkind = \"forest\"").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: AppConfig =
            toml::from_str("[predictor]\nkind = \"learned\"\n[server]\nport = 9000").unwrap();
        config
            .apply_env(env(&[
                (ENV_PREDICTOR, "heuristic"),
                (ENV_MODEL, "/srv/model.json"),
                (ENV_ANSWER_MODEL, "/srv/answers.json"),
                (ENV_PORT, "8080"),
            ]))
            .unwrap();
        assert_eq!(config.predictor.kind, PredictorKind::Heuristic);
        assert_eq!(
            config.predictor.model_path.as_deref(),
            Some(Path::new("/srv/model.json"))
        );
        assert_eq!(
            config.answers.model_path.as_deref(),
            Some(Path::new("/srv/answers.json"))
        );
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[(ENV_PORT, "eighty")])).is_err());
        assert!(config.apply_env(env(&[(ENV_PREDICTOR, "forest")])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_training_values() {
        let mut config = AppConfig::default();
        config.training.test_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.training.learning_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");

        assert!(AppConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_init_writes_parsable_example_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let written = AppConfig::init(Some(&path)).unwrap();
        assert_eq!(written, path);

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config, AppConfig::default());

        std::fs::write(&path, "[server]\nport = 1234\n").unwrap();
        AppConfig::init(Some(&path)).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap().server.port, 1234);
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_user_config_path() {
        if let Some(p) = AppConfig::user_config_path() {
            assert!(p.ends_with("difficulty-detector/config.toml"));
        }
    }
}
