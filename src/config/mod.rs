//! Configuration module for difficulty-detector
//!
//! This module handles:
//! - The TOML config file (predictor, answer model, server, training)
//! - `DIFFICULTY_DETECTOR_*` environment overrides
//! - The `config init` example file

mod app_config;

pub use app_config::{
    AnswersSection, AppConfig, PredictorSection, ServerSection, TrainingSection, ENV_ANSWER_MODEL,
    ENV_MODEL, ENV_PORT, ENV_PREDICTOR,
};
