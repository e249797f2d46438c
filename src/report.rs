use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::evaluator::Prediction;
use crate::question::Question;
use crate::rules::{Confidence, Rule};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

impl Tally {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.accuracy = ratio(self.correct, self.total);
    }
}

/// What the score would be if only the more reliable picks are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreRange {
    pub guaranteed: usize,
    pub with_probable: usize,
    pub maximum: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub total: usize,
    pub correct: usize,
    pub overall_accuracy: f64,
    pub by_confidence: BTreeMap<Confidence, Tally>,
    pub by_rule: BTreeMap<Rule, Tally>,
    pub score_range: ScoreRange,
    pub wrong_question_ids: Vec<u32>,
}

impl AccuracyReport {
    /// Score predictions against the corpus labels. Predictions for ids
    /// missing from `questions` are ignored.
    pub fn from_predictions(questions: &[Question], predictions: &[Prediction]) -> Self {
        let answers: HashMap<u32, usize> = questions
            .iter()
            .map(|q| (q.id(), q.correct_index()))
            .collect();

        let mut by_confidence: BTreeMap<Confidence, Tally> = Confidence::ALL
            .iter()
            .map(|c| (*c, Tally::default()))
            .collect();
        let mut by_rule: BTreeMap<Rule, Tally> = BTreeMap::new();
        let mut overall = Tally::default();
        let mut wrong_question_ids = Vec::new();

        for p in predictions {
            let Some(&answer) = answers.get(&p.question_id) else {
                continue;
            };
            let correct = p.predicted_option_index == answer;
            overall.record(correct);
            by_confidence.entry(p.confidence).or_default().record(correct);
            by_rule.entry(p.rule_id).or_default().record(correct);
            if !correct {
                wrong_question_ids.push(p.question_id);
            }
        }
        wrong_question_ids.sort_unstable();

        let correct_at = |c: Confidence| by_confidence.get(&c).map_or(0, |t| t.correct);
        let guaranteed = correct_at(Confidence::Certain);
        let score_range = ScoreRange {
            guaranteed,
            with_probable: guaranteed + correct_at(Confidence::Probable),
            maximum: overall.correct,
        };

        Self {
            total: overall.total,
            correct: overall.correct,
            overall_accuracy: overall.accuracy,
            by_confidence,
            by_rule,
            score_range,
            wrong_question_ids,
        }
    }
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round4(part as f64 / whole as f64)
    }
}

/// Rounded so serialized reports stay stable and readable.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
