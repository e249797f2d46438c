use rayon::prelude::*;
use serde::Serialize;

use crate::question::Question;
use crate::rules::{Confidence, Outcome, Rule, RuleLibrary};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub question_id: u32,
    pub predicted_option_index: usize,
    pub confidence: Confidence,
    pub rule_id: Rule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum StepEffect {
    Skipped,
    NoOpinion,
    Eliminated { removed: Vec<usize> },
    Picked { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub rule: Rule,
    #[serde(flatten)]
    pub effect: StepEffect,
}

/// A prediction together with every rule the chain consulted on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub prediction: Prediction,
    pub steps: Vec<TraceStep>,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Runs the rule chain. Eliminations compose; the first rule that picks
/// ends the chain. The library guarantees the last rule always picks.
#[derive(Debug, Clone)]
pub struct Evaluator {
    library: RuleLibrary,
}

impl Evaluator {
    pub fn new(library: RuleLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &RuleLibrary {
        &self.library
    }

    pub fn evaluate(&self, question: &Question) -> Prediction {
        self.run(question, None)
    }

    pub fn explain(&self, question: &Question) -> Explanation {
        let mut steps = Vec::new();
        let prediction = self.run(question, Some(&mut steps));
        Explanation { prediction, steps }
    }

    /// Predictions in corpus order. Questions are independent, so they are
    /// evaluated in parallel against the shared read-only library.
    pub fn evaluate_all(&self, questions: &[Question]) -> Vec<Prediction> {
        let predictions: Vec<Prediction> =
            questions.par_iter().map(|q| self.evaluate(q)).collect();
        tracing::info!("Evaluated {} questions", predictions.len());
        predictions
    }

    fn run(&self, question: &Question, mut trace: Option<&mut Vec<TraceStep>>) -> Prediction {
        let mut ctx = self.library.context(question);
        let mut record = |rule: Rule, effect: StepEffect| {
            if let Some(steps) = trace.as_deref_mut() {
                steps.push(TraceStep { rule, effect });
            }
        };

        for &rule in self.library.rules() {
            if ctx.is_negative() && rule.assumes_positive_phrasing() {
                record(rule, StepEffect::Skipped);
                continue;
            }
            match self.library.apply(rule, &ctx) {
                Outcome::NoOpinion => record(rule, StepEffect::NoOpinion),
                Outcome::Narrowed(survivors) => {
                    let removed = ctx
                        .live()
                        .iter()
                        .copied()
                        .filter(|i| !survivors.contains(i))
                        .collect();
                    record(rule, StepEffect::Eliminated { removed });
                    ctx.narrow(survivors, rule);
                }
                Outcome::Pick(pick) => {
                    record(rule, StepEffect::Picked { index: pick.index });
                    tracing::debug!(
                        "question {}: {} picked option {} ({})",
                        question.id(),
                        rule,
                        pick.index,
                        pick.confidence
                    );
                    return Prediction {
                        question_id: question.id(),
                        predicted_option_index: pick.index,
                        confidence: pick.confidence,
                        rule_id: rule,
                        trigger: pick.trigger,
                    };
                }
            }
        }

        // Only reachable with an empty live set, which narrowing forbids.
        Prediction {
            question_id: question.id(),
            predicted_option_index: ctx.live().first().copied().unwrap_or(0),
            confidence: Confidence::Gamble,
            rule_id: Rule::FirstLongest,
            trigger: None,
        }
    }
}
