//! CLI command definitions and handlers

mod classify;
mod config;
mod predict;
mod serve;
mod train;

use anyhow::Result;
use clap::{Parser, Subcommand};
use difficulty_detector::config::AppConfig;
use difficulty_detector::predictor::PredictorKind;
use std::path::PathBuf;

/// Difficulty detector - perceived-difficulty prediction for learning sessions
#[derive(Parser, Debug)]
#[command(name = "difficulty-detector")]
#[command(
    version,
    about = "Predict how difficult a learner found a video from interaction telemetry, and classify submitted code answers",
    after_help = "\
Examples:
  difficulty-detector score '{\"session_duration\": 300, \"total_pauses\": 12}'
  difficulty-detector predict --input session.json --output result.json
  difficulty-detector train --model models/difficulty.json
  difficulty-detector update --model models/difficulty.json --input report.json
  difficulty-detector serve --port 8000"
)]
pub struct Cli {
    /// Config file (default: <config_dir>/difficulty-detector/config.toml)
    #[arg(long, global = true, env = "DIFFICULTY_DETECTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict difficulty for one session read from a JSON file
    #[command(after_help = "\
Examples:
  difficulty-detector predict --input session.json --output result.json
  difficulty-detector predict --model models/difficulty.json --input session.json

Passing --model without --predictor selects the learned predictor.")]
    Predict {
        /// Learned model artifact (default: predictor.model_path from config)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Predictor implementation (default: predictor.kind from config)
        #[arg(long, value_enum)]
        predictor: Option<PredictorKind>,

        /// JSON object with interaction metrics
        #[arg(long)]
        input: PathBuf,

        /// Where to write the result (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Record a learner-reported session and refit the learned model
    Update {
        #[arg(long)]
        model: PathBuf,

        /// JSON object with interaction metrics and `reported_difficulty`
        #[arg(long)]
        input: PathBuf,
    },

    /// Train the learned predictor on labelled sessions or synthetic data
    #[command(after_help = "\
Examples:
  difficulty-detector train --model models/difficulty.json
  difficulty-detector train --model models/difficulty.json --data sessions.json
  difficulty-detector train --model models/difficulty.json --samples 5000")]
    Train {
        /// Where to save the model
        #[arg(long)]
        model: PathBuf,

        /// JSON array of labelled sessions (default: synthetic data)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Number of synthetic sessions (default: training.synthetic_samples)
        #[arg(long, conflicts_with = "data")]
        samples: Option<usize>,
    },

    /// Score an inline JSON object with the rule-based predictor
    Score {
        /// JSON object with interaction metrics
        json: String,
    },

    /// Classify a code answer as "Incomplete Answer", "Syntax Error" or "correct"
    Classify {
        /// Answer classifier artifact (default: answers.model_path from config)
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long)]
        instruction: String,

        #[arg(long, default_value = "")]
        input_text: String,

        /// The submitted code
        #[arg(long, required_unless_present = "answer_file", conflicts_with = "answer_file")]
        answer: Option<String>,

        /// Read the submitted code from a file
        #[arg(long)]
        answer_file: Option<PathBuf>,
    },

    /// Train the answer classifier from a JSONL dataset
    TrainAnswers {
        /// JSONL rows of {instruction, input_text, user_answer, answer_type}
        #[arg(long)]
        data: PathBuf,

        /// Where to save the model
        #[arg(long)]
        output: PathBuf,
    },

    /// Start the HTTP gateway
    Serve {
        /// Bind address (default: server.host from config)
        #[arg(long)]
        host: Option<String>,

        /// Port (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example config file (kept if one already exists)
    Init {
        /// Destination (default: the user config path)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the effective configuration
    Show,
}

pub fn run(cli: Cli) -> Result<()> {
    // `config init` must work even when the existing file is broken
    if let Commands::Config {
        action: ConfigAction::Init { path },
    } = &cli.command
    {
        return config::init(path.as_deref().or(cli.config.as_deref()));
    }

    let app = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Predict {
            model,
            predictor,
            input,
            output,
        } => predict::run(&app, model, predictor, &input, output.as_deref()),

        Commands::Update { model, input } => predict::update(&app, &model, &input),

        Commands::Train {
            model,
            data,
            samples,
        } => train::run(&app, &model, data.as_deref(), samples),

        Commands::Score { json } => predict::score(&json),

        Commands::Classify {
            model,
            instruction,
            input_text,
            answer,
            answer_file,
        } => classify::run(
            &app,
            model,
            instruction,
            input_text,
            answer,
            answer_file.as_deref(),
        ),

        Commands::TrainAnswers { data, output } => train::answers(&app, &data, &output),

        Commands::Serve { host, port } => serve::run(app, host, port),

        Commands::Config { action } => match action {
            ConfigAction::Show => config::show(&app),
            ConfigAction::Init { .. } => Ok(()),
        },
    }
}
