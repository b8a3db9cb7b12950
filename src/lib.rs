//! difficulty-detector
//!
//! Predicts how difficult a learner found a video from aggregated
//! interaction telemetry, and labels submitted code answers.
//!
//! - [`features`]: shared feature derivation for training and inference
//! - [`predictor`]: rule-based and learned difficulty predictors
//! - [`answers`]: code-answer classifier
//! - [`server`]: HTTP gateway
//! - [`config`]: TOML + environment configuration

pub mod answers;
pub mod config;
pub mod features;
pub mod models;
pub mod predictor;
pub mod server;
