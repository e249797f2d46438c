//! Offline calibration: derive keyword tiers, trap words, golden duplicate
//! words and the structural rule order from a labeled corpus.
//!
//! The same corpus and thresholds always yield the same configuration.
//! Ties are broken by exact integer comparison of rates and then
//! lexically, never by hash order or float rounding.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{CalibratedConfig, KeywordTier, TierKeyword};
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::normalize::{contains_term, term_words};
use crate::question::Question;
use crate::report::{ratio, AccuracyReport};
use crate::rules::{
    is_universal_option, Confidence, Outcome, QuestionContext, Rule, RuleKind, RuleLibrary,
};
use crate::stats::{CorpusStatistics, Feature, TriggerCounts};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierFloor {
    pub level: u8,
    pub confidence: Confidence,
    pub min_hit_rate: f64,
}

/// Empirical cut-offs. None of these come from a statistical test; they are
/// what separated signal from noise on the reference bank. Fields missing
/// from a thresholds file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationThresholds {
    /// Unique occurrences a trigger needs before it can join a tier.
    pub min_samples: usize,
    /// Checked in order; a trigger lands in the first tier whose floor it
    /// meets.
    pub tier_floors: Vec<TierFloor>,
    pub trap_min_samples: usize,
    pub trap_max_hit_rate: f64,
    pub duplicate_min_samples: usize,
    pub duplicate_min_hit_rate: f64,
    /// Score adjacent word pairs as triggers too.
    pub phrases: bool,
}

impl Default for CalibrationThresholds {
    fn default() -> Self {
        Self {
            min_samples: 3,
            tier_floors: vec![
                TierFloor {
                    level: 1,
                    confidence: Confidence::Certain,
                    min_hit_rate: 1.0,
                },
                TierFloor {
                    level: 2,
                    confidence: Confidence::Probable,
                    min_hit_rate: 0.85,
                },
                TierFloor {
                    level: 3,
                    confidence: Confidence::Gamble,
                    min_hit_rate: 0.75,
                },
            ],
            trap_min_samples: 5,
            trap_max_hit_rate: 0.20,
            duplicate_min_samples: 2,
            duplicate_min_hit_rate: 0.80,
            phrases: true,
        }
    }
}

impl CalibrationThresholds {
    pub fn from_json(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::Json {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, path)
    }
}

// ---------------------------------------------------------------------------
// Report structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRate {
    pub options: usize,
    pub correct: usize,
    pub hit_rate: f64,
}

/// How a rule performs on its own. Decision rules are measured after the
/// elimination passes have run; elimination rules on the untouched option
/// set, where `correct` counts passes that removed only wrong options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RulePerformance {
    pub rule: Rule,
    pub fired: usize,
    pub correct: usize,
    pub precision: f64,
    pub coverage: f64,
}

/// Questions where two rules both picked but disagreed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConflict {
    pub first: Rule,
    pub second: Rule,
    pub disagreements: usize,
    pub first_wins: usize,
    pub second_wins: usize,
}

/// Two tier keywords that each singled out a different option of the same
/// question. `first` sorts before `second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordConflict {
    pub first: String,
    pub second: String,
    pub disagreements: usize,
    pub first_wins: usize,
    pub second_wins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub questions: usize,
    pub questions_scored: usize,
    pub candidates: usize,
    /// Candidates dropped for too few samples. Not an error.
    pub insufficient_samples: usize,
    pub features: BTreeMap<Feature, FeatureRate>,
    pub correct_position: Vec<usize>,
    pub rule_performance: Vec<RulePerformance>,
    pub conflicts: Vec<RuleConflict>,
    pub keyword_conflicts: Vec<KeywordConflict>,
    pub accuracy: AccuracyReport,
}

#[derive(Debug, Clone)]
pub struct Calibration {
    pub config: CalibratedConfig,
    pub statistics: CorpusStatistics,
    pub report: CalibrationReport,
}

// ---------------------------------------------------------------------------
// Calibrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    thresholds: CalibrationThresholds,
    base: CalibratedConfig,
}

/// Rules whose pairwise conflicts are measured.
const CONFLICT_RULES: [Rule; 5] = [
    Rule::KeywordTiers,
    Rule::Parenthetical,
    Rule::Echo,
    Rule::DuplicateKeyword,
    Rule::LongestOption,
];

impl Calibrator {
    pub fn new(thresholds: CalibrationThresholds) -> Self {
        Self {
            thresholds,
            base: CalibratedConfig::default(),
        }
    }

    /// Settings the corpus cannot derive (vetoes, verb prefixes, domain
    /// terms, negation markers, any-count duplicate words) come from `base`.
    pub fn with_base(mut self, base: CalibratedConfig) -> Self {
        self.base = base;
        self
    }

    pub fn thresholds(&self) -> &CalibrationThresholds {
        &self.thresholds
    }

    pub fn calibrate(&self, questions: &[Question]) -> Result<Calibration> {
        let statistics =
            CorpusStatistics::collect(questions, self.base.min_token_len, self.thresholds.phrases);

        let (mut keyword_tiers, insufficient) = self.keyword_tiers(&statistics);
        let keyword_conflicts = measure_keyword_conflicts(&keyword_tiers, questions);
        reorder_keywords(&mut keyword_tiers, &keyword_conflicts);
        let tier_words: BTreeSet<&str> = keyword_tiers
            .iter()
            .flat_map(|t| t.words.iter().map(|k| k.word.as_str()))
            .collect();
        let trap_words = self.trap_words(&statistics, &tier_words);
        let golden_duplicate_words = self.golden_duplicates(&statistics);
        let tier_keyword_count = tier_words.len();

        let mut config = self.base.clone();
        config.keyword_tiers = keyword_tiers;
        config.trap_words = trap_words;
        config.golden_duplicate_words = golden_duplicate_words;

        let draft = RuleLibrary::new(config.clone())?;
        let rule_performance = measure_rules(&draft, questions);
        let conflicts = measure_conflicts(&draft, questions);
        config.rule_priority_order =
            reorder_structural(&self.base.rule_priority_order, &rule_performance, &conflicts);

        let evaluator = Evaluator::new(RuleLibrary::new(config.clone())?);
        let predictions = evaluator.evaluate_all(questions);
        let accuracy = AccuracyReport::from_predictions(questions, &predictions);

        tracing::info!(
            "Calibrated on {} questions: {} tier keywords, {} trap words, accuracy {:.1}%",
            statistics.questions,
            tier_keyword_count,
            config.trap_words.len(),
            accuracy.overall_accuracy * 100.0
        );

        let report = CalibrationReport {
            questions: statistics.questions,
            questions_scored: statistics.questions_scored,
            candidates: statistics.triggers.len(),
            insufficient_samples: insufficient,
            features: statistics
                .features
                .iter()
                .map(|(f, c)| {
                    (
                        *f,
                        FeatureRate {
                            options: c.options,
                            correct: c.correct,
                            hit_rate: ratio(c.correct, c.options),
                        },
                    )
                })
                .collect(),
            correct_position: statistics.correct_position.clone(),
            rule_performance,
            conflicts,
            keyword_conflicts,
            accuracy,
        };

        Ok(Calibration {
            config,
            statistics,
            report,
        })
    }

    // -----------------------------------------------------------------------
    // Trigger ranking
    // -----------------------------------------------------------------------

    /// Returns the tiers and the number of candidates with too few unique
    /// occurrences to judge.
    fn keyword_tiers(&self, stats: &CorpusStatistics) -> (Vec<KeywordTier>, usize) {
        let mut floors = self.thresholds.tier_floors.clone();
        floors.sort_by_key(|f| f.level);

        let mut buckets: Vec<Vec<(&str, &TriggerCounts)>> = vec![Vec::new(); floors.len()];
        let mut insufficient = 0usize;

        for (trigger, counts) in &stats.triggers {
            if counts.unique_occurrences < self.thresholds.min_samples {
                insufficient += 1;
                tracing::debug!(
                    "'{}' skipped: {} unique occurrences (need {})",
                    trigger,
                    counts.unique_occurrences,
                    self.thresholds.min_samples
                );
                continue;
            }
            let rate = counts.unique_correct as f64 / counts.unique_occurrences as f64;
            if let Some(slot) = floors.iter().position(|f| rate >= f.min_hit_rate) {
                buckets[slot].push((trigger.as_str(), counts));
            }
        }

        let tiers = floors
            .iter()
            .zip(buckets)
            .filter(|(_, words)| !words.is_empty())
            .map(|(floor, mut words)| {
                words.sort_by(|a, b| {
                    compare_rates(
                        (b.1.unique_correct, b.1.unique_occurrences),
                        (a.1.unique_correct, a.1.unique_occurrences),
                    )
                    .then_with(|| b.1.unique_occurrences.cmp(&a.1.unique_occurrences))
                    .then_with(|| a.0.cmp(b.0))
                });
                KeywordTier {
                    level: floor.level,
                    confidence: floor.confidence,
                    words: words
                        .into_iter()
                        .map(|(word, c)| TierKeyword {
                            word: word.to_string(),
                            hit_rate: Some(ratio(c.unique_correct, c.unique_occurrences)),
                            samples: Some(c.unique_occurrences),
                        })
                        .collect(),
                }
            })
            .collect();
        (tiers, insufficient)
    }

    fn trap_words(&self, stats: &CorpusStatistics, tier_words: &BTreeSet<&str>) -> BTreeSet<String> {
        stats
            .triggers
            .iter()
            .filter(|(trigger, _)| !trigger.contains(' ') && !tier_words.contains(trigger.as_str()))
            .filter(|(_, c)| {
                c.option_occurrences >= self.thresholds.trap_min_samples
                    && (c.correct_occurrences as f64 / c.option_occurrences as f64)
                        <= self.thresholds.trap_max_hit_rate
            })
            .map(|(trigger, _)| trigger.clone())
            .collect()
    }

    /// Single alphabetic words only: the duplicate-keyword rule counts
    /// holders by [`crate::normalize::words`].
    fn golden_duplicates(&self, stats: &CorpusStatistics) -> BTreeSet<String> {
        stats
            .triggers
            .iter()
            .filter(|(trigger, _)| trigger.chars().all(|c| c.is_ascii_alphabetic()))
            .filter(|(_, c)| {
                let pair = c.multiplicity(2);
                pair.questions >= self.thresholds.duplicate_min_samples
                    && (pair.correct_among as f64 / pair.questions as f64)
                        >= self.thresholds.duplicate_min_hit_rate
            })
            .map(|(trigger, _)| trigger.clone())
            .collect()
    }
}

/// Head-to-head records between tier keywords over the scored questions,
/// on the untouched option set.
fn measure_keyword_conflicts(tiers: &[KeywordTier], questions: &[Question]) -> Vec<KeywordConflict> {
    let keywords: Vec<(&str, Vec<String>)> = tiers
        .iter()
        .flat_map(|t| &t.words)
        .map(|k| (k.word.as_str(), term_words(&k.word)))
        .collect();

    let mut table: BTreeMap<(&str, &str), KeywordConflict> = BTreeMap::new();
    for q in questions {
        if q.is_binary() || q.options().iter().any(|o| is_universal_option(&o.text)) {
            continue;
        }
        let option_terms: Vec<Vec<String>> =
            q.options().iter().map(|o| term_words(&o.text)).collect();
        let singled: Vec<(&str, usize)> = keywords
            .iter()
            .filter_map(|(word, terms)| {
                let holders: Vec<usize> = option_terms
                    .iter()
                    .enumerate()
                    .filter(|(_, opt)| contains_term(opt, terms))
                    .map(|(i, _)| i)
                    .collect();
                match holders.as_slice() {
                    [only] => Some((*word, *only)),
                    _ => None,
                }
            })
            .collect();

        for (n, &(word_a, pick_a)) in singled.iter().enumerate() {
            for &(word_b, pick_b) in &singled[n + 1..] {
                if pick_a == pick_b {
                    continue;
                }
                let ((first, first_pick), (second, second_pick)) = if word_a <= word_b {
                    ((word_a, pick_a), (word_b, pick_b))
                } else {
                    ((word_b, pick_b), (word_a, pick_a))
                };
                let entry = table
                    .entry((first, second))
                    .or_insert_with(|| KeywordConflict {
                        first: first.to_string(),
                        second: second.to_string(),
                        disagreements: 0,
                        first_wins: 0,
                        second_wins: 0,
                    });
                entry.disagreements += 1;
                if first_pick == q.correct_index() {
                    entry.first_wins += 1;
                } else if second_pick == q.correct_index() {
                    entry.second_wins += 1;
                }
            }
        }
    }
    table.into_values().collect()
}

/// Within each tier, keywords with more net head-to-head wins against tier
/// mates move ahead; otherwise the ranking order stands.
fn reorder_keywords(tiers: &mut [KeywordTier], conflicts: &[KeywordConflict]) {
    for tier in tiers {
        let members: BTreeSet<String> = tier.words.iter().map(|k| k.word.clone()).collect();
        let net = |word: &str| -> i64 {
            conflicts
                .iter()
                .filter(|c| members.contains(&c.first) && members.contains(&c.second))
                .map(|c| {
                    let (first, second) = (c.first_wins as i64, c.second_wins as i64);
                    if c.first == word {
                        first - second
                    } else if c.second == word {
                        second - first
                    } else {
                        0
                    }
                })
                .sum()
        };
        tier.words.sort_by_key(|k| Reverse(net(&k.word)));
    }
}

/// Compare `a.0 / a.1` with `b.0 / b.1` exactly.
fn compare_rates(a: (usize, usize), b: (usize, usize)) -> Ordering {
    (a.0 * b.1).cmp(&(b.0 * a.1))
}

// ---------------------------------------------------------------------------
// Rule measurement
// ---------------------------------------------------------------------------

/// Context with every elimination pass applied, as the evaluator would see
/// it when it reaches the decision rules.
fn eliminated_context<'q>(library: &RuleLibrary, question: &'q Question) -> QuestionContext<'q> {
    let mut ctx = library.context(question);
    for &rule in library.rules() {
        if rule.kind() != RuleKind::Elimination {
            continue;
        }
        if let Outcome::Narrowed(survivors) = library.apply(rule, &ctx) {
            ctx.narrow(survivors, rule);
        }
    }
    ctx
}

fn isolated_pick(library: &RuleLibrary, rule: Rule, ctx: &QuestionContext<'_>) -> Option<usize> {
    if ctx.is_negative() && rule.assumes_positive_phrasing() {
        return None;
    }
    match library.apply(rule, ctx) {
        Outcome::Pick(pick) => Some(pick.index),
        _ => None,
    }
}

fn measure_rules(library: &RuleLibrary, questions: &[Question]) -> Vec<RulePerformance> {
    let total = questions.len();
    let prepared: Vec<QuestionContext<'_>> = questions
        .iter()
        .map(|q| eliminated_context(library, q))
        .collect();

    Rule::ALL
        .iter()
        .map(|&rule| {
            let mut fired = 0usize;
            let mut correct = 0usize;
            for (q, prepared_ctx) in questions.iter().zip(&prepared) {
                match rule.kind() {
                    RuleKind::Elimination => {
                        let ctx = library.context(q);
                        if let Outcome::Narrowed(survivors) = library.apply(rule, &ctx) {
                            fired += 1;
                            if survivors.contains(&q.correct_index()) {
                                correct += 1;
                            }
                        }
                    }
                    RuleKind::Decision => {
                        if let Some(index) = isolated_pick(library, rule, prepared_ctx) {
                            fired += 1;
                            if index == q.correct_index() {
                                correct += 1;
                            }
                        }
                    }
                }
            }
            RulePerformance {
                rule,
                fired,
                correct,
                precision: ratio(correct, fired),
                coverage: ratio(fired, total),
            }
        })
        .collect()
}

fn measure_conflicts(library: &RuleLibrary, questions: &[Question]) -> Vec<RuleConflict> {
    let picks: Vec<(usize, Vec<Option<usize>>)> = questions
        .iter()
        .map(|q| {
            let ctx = eliminated_context(library, q);
            let row = CONFLICT_RULES
                .iter()
                .map(|&r| isolated_pick(library, r, &ctx))
                .collect();
            (q.correct_index(), row)
        })
        .collect();

    let mut conflicts = Vec::new();
    for a in 0..CONFLICT_RULES.len() {
        for b in (a + 1)..CONFLICT_RULES.len() {
            let mut conflict = RuleConflict {
                first: CONFLICT_RULES[a],
                second: CONFLICT_RULES[b],
                disagreements: 0,
                first_wins: 0,
                second_wins: 0,
            };
            for (answer, row) in &picks {
                let (Some(pa), Some(pb)) = (row[a], row[b]) else {
                    continue;
                };
                if pa == pb {
                    continue;
                }
                conflict.disagreements += 1;
                if pa == *answer {
                    conflict.first_wins += 1;
                } else if pb == *answer {
                    conflict.second_wins += 1;
                }
            }
            conflicts.push(conflict);
        }
    }
    conflicts
}

/// Reorder the reorderable structural rules inside the slots they occupy in
/// `base`: most head-to-head wins against each other first, then higher
/// precision, then their order in `base`.
fn reorder_structural(
    base: &[Rule],
    performance: &[RulePerformance],
    conflicts: &[RuleConflict],
) -> Vec<Rule> {
    let wins = |rule: Rule| -> usize {
        conflicts
            .iter()
            .filter(|c| Rule::REORDERABLE.contains(&c.first) && Rule::REORDERABLE.contains(&c.second))
            .map(|c| {
                if c.first == rule {
                    c.first_wins
                } else if c.second == rule {
                    c.second_wins
                } else {
                    0
                }
            })
            .sum()
    };
    let record = |rule: Rule| -> (usize, usize) {
        performance
            .iter()
            .find(|p| p.rule == rule)
            .map_or((0, 0), |p| (p.correct, p.fired))
    };

    let mut ranked: Vec<Rule> = base
        .iter()
        .copied()
        .filter(|r| Rule::REORDERABLE.contains(r))
        .collect();
    ranked.sort_by(|a, b| {
        wins(*b)
            .cmp(&wins(*a))
            .then_with(|| compare_rates(record(*b), record(*a)))
    });

    let mut ranked = ranked.into_iter();
    let reordered: Vec<Rule> = base
        .iter()
        .map(|r| {
            if Rule::REORDERABLE.contains(r) {
                ranked.next().unwrap_or(*r)
            } else {
                *r
            }
        })
        .collect();

    tracing::debug!(
        "structural order: {}",
        reordered
            .iter()
            .filter(|r| Rule::REORDERABLE.contains(r))
            .map(|r| r.id())
            .collect::<Vec<_>>()
            .join(", ")
    );
    reordered
}
