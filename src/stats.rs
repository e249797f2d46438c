//! Corpus statistics: one pure pass over a labeled corpus producing the
//! counters the calibrator ranks triggers by. Recomputed from scratch on
//! every calibration run.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::normalize::{phrases, trigger_words, word_count};
use crate::question::Question;
use crate::rules::{has_parenthetical, is_negated_option, is_none_option, is_universal_option};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Questions where a trigger was held by exactly `k` options, and how many
/// of those had the correct option among the holders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MultiplicityCounts {
    pub questions: usize,
    pub correct_among: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriggerCounts {
    /// Options containing the trigger.
    pub option_occurrences: usize,
    /// Of those, options that were correct.
    pub correct_occurrences: usize,
    /// Questions where exactly one option contained the trigger.
    pub unique_occurrences: usize,
    /// Of those, questions where that option was correct.
    pub unique_correct: usize,
    pub by_multiplicity: BTreeMap<usize, MultiplicityCounts>,
}

impl TriggerCounts {
    pub fn multiplicity(&self, k: usize) -> MultiplicityCounts {
        self.by_multiplicity.get(&k).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Parenthetical,
    Longest,
    Shortest,
    NoneStyle,
    Universal,
    Negated,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Parenthetical,
        Feature::Longest,
        Feature::Shortest,
        Feature::NoneStyle,
        Feature::Universal,
        Feature::Negated,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureCounts {
    pub options: usize,
    pub correct: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStatistics {
    pub questions: usize,
    /// Questions contributing to trigger counts. True/false questions and
    /// questions with an "all of the above" option are left out: other rules
    /// decide those before any keyword is consulted.
    pub questions_scored: usize,
    pub triggers: BTreeMap<String, TriggerCounts>,
    pub features: BTreeMap<Feature, FeatureCounts>,
    /// How often the correct answer sat at each option position.
    pub correct_position: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

impl CorpusStatistics {
    pub fn collect(questions: &[Question], min_token_len: usize, with_phrases: bool) -> Self {
        let mut stats = CorpusStatistics {
            questions: questions.len(),
            features: Feature::ALL
                .iter()
                .map(|f| (*f, FeatureCounts::default()))
                .collect(),
            ..Default::default()
        };

        for q in questions {
            stats.count_position(q);
            stats.count_features(q);
            if q.is_binary() || q.options().iter().any(|o| is_universal_option(&o.text)) {
                continue;
            }
            stats.questions_scored += 1;
            stats.count_triggers(q, min_token_len, with_phrases);
        }
        stats
    }

    fn count_position(&mut self, q: &Question) {
        let pos = q.correct_index();
        if self.correct_position.len() <= pos {
            self.correct_position.resize(pos + 1, 0);
        }
        self.correct_position[pos] += 1;
    }

    fn count_features(&mut self, q: &Question) {
        let lengths: Vec<usize> = q.options().iter().map(|o| word_count(&o.text)).collect();
        let max = lengths.iter().copied().max().unwrap_or(0);
        let min = lengths.iter().copied().min().unwrap_or(0);

        for (i, opt) in q.options().iter().enumerate() {
            let present = [
                (Feature::Parenthetical, has_parenthetical(&opt.text)),
                (Feature::Longest, lengths[i] == max),
                (Feature::Shortest, lengths[i] == min),
                (Feature::NoneStyle, is_none_option(&opt.text)),
                (Feature::Universal, is_universal_option(&opt.text)),
                (Feature::Negated, is_negated_option(&opt.text)),
            ];
            for (feature, hit) in present {
                if !hit {
                    continue;
                }
                let counts = self.features.entry(feature).or_default();
                counts.options += 1;
                if opt.correct {
                    counts.correct += 1;
                }
            }
        }
    }

    fn count_triggers(&mut self, q: &Question, min_token_len: usize, with_phrases: bool) {
        let per_option: Vec<BTreeSet<String>> = q
            .options()
            .iter()
            .map(|o| {
                let mut triggers = trigger_words(&o.text, min_token_len);
                if with_phrases {
                    triggers.extend(phrases(&o.text, min_token_len));
                }
                triggers
            })
            .collect();
        let all: BTreeSet<&String> = per_option.iter().flatten().collect();
        let correct = q.correct_index();

        for trigger in all {
            let holders: Vec<usize> = per_option
                .iter()
                .enumerate()
                .filter(|(_, set)| set.contains(trigger))
                .map(|(i, _)| i)
                .collect();
            let correct_held = holders.contains(&correct);
            let counts = self.triggers.entry(trigger.clone()).or_default();

            counts.option_occurrences += holders.len();
            if correct_held {
                counts.correct_occurrences += 1;
            }
            if holders.len() == 1 {
                counts.unique_occurrences += 1;
                if correct_held {
                    counts.unique_correct += 1;
                }
            } else {
                let k = counts.by_multiplicity.entry(holders.len()).or_default();
                k.questions += 1;
                if correct_held {
                    k.correct_among += 1;
                }
            }
        }
    }
}
