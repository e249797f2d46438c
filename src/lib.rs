//! Heuristic answer prediction for multiple-choice question banks.
//!
//! A fixed chain of text-pattern rules (negation, "all of the above",
//! elimination passes, calibrated keyword tiers, structural cues) picks one
//! option per question and labels the pick certain, probable or gamble.
//! The calibrator derives the keyword and trap-word data from a labeled
//! corpus.

pub mod calibrate;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod normalize;
pub mod question;
pub mod report;
pub mod rules;
pub mod stats;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use calibrate::{Calibration, CalibrationThresholds, Calibrator};
pub use config::CalibratedConfig;
pub use error::{Error, Result};
pub use evaluator::{Evaluator, Explanation, Prediction};
pub use question::{load_corpus, AnswerOption, Question};
pub use report::AccuracyReport;
pub use rules::{Confidence, Rule, RuleLibrary};

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub report: AccuracyReport,
    pub predictions: Vec<Prediction>,
}

/// Run the rule chain built from `config` over every question and score it.
pub fn evaluate_corpus(questions: &[Question], config: CalibratedConfig) -> Result<EvaluationResult> {
    let evaluator = Evaluator::new(RuleLibrary::new(config)?);
    let predictions = evaluator.evaluate_all(questions);
    let report = AccuracyReport::from_predictions(questions, &predictions);
    Ok(EvaluationResult {
        report,
        predictions,
    })
}

/// Predict a single question with the reference configuration.
pub fn predict(question: &Question) -> Result<Prediction> {
    let evaluator = Evaluator::new(RuleLibrary::new(CalibratedConfig::default())?);
    Ok(evaluator.evaluate(question))
}

pub const DEFAULT_LOG_FILTER: &str = "mcq_sleuth=info";

/// Log filter built from `directives` (normally `RUST_LOG`). Falls back to
/// [`DEFAULT_LOG_FILTER`] when unset, blank or unparsable.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
