//! Feature extraction
//!
//! Shared by training and inference so both see identical features:
//! - `interaction`: video telemetry -> `InteractionMetrics` / model vector
//! - `code`: submitted Python answer -> `CodeFeatures` / merged text

pub mod code;
pub mod interaction;

pub use code::{merged_text, CodeFeatures, KEYWORDS, NUM_CODE_FEATURES};
pub use interaction::{
    extract_metrics, parse_object, parse_raw_interaction, InputError, FEATURE_NAMES, NUM_FEATURES,
};
