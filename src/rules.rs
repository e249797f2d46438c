//! The rule catalog.
//!
//! Each [`Rule`] is a pure function of a [`QuestionContext`]: it either
//! narrows the live candidate set (elimination rules), commits to a
//! [`Pick`], or has no opinion. The [`RuleLibrary`] owns the ordered rule
//! list and the calibrated trigger data the rules key off.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::CalibratedConfig;
use crate::error::{Error, Result};
use crate::normalize::{contains_term, term_words, tokens, word_count, words};
use crate::question::Question;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Coarse reliability of a pick. Ordered from most to least reliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Certain,
    Probable,
    Gamble,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::Certain, Confidence::Probable, Confidence::Gamble];

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Certain => "certain",
            Confidence::Probable => "probable",
            Confidence::Gamble => "gamble",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    BinarySentiment,
    UniversalQuantifier,
    EliminateNone,
    EliminateVerbPrefix,
    EliminateTrapWords,
    EliminateDomainTerm,
    SoleSurvivor,
    NegativeQuestion,
    KeywordTiers,
    Parenthetical,
    Echo,
    DuplicateKeyword,
    LongestOption,
    LastResortKeywords,
    FirstLongest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Elimination,
    Decision,
}

impl Rule {
    /// Default evaluation order.
    pub const ALL: [Rule; 15] = [
        Rule::BinarySentiment,
        Rule::UniversalQuantifier,
        Rule::EliminateNone,
        Rule::EliminateVerbPrefix,
        Rule::EliminateTrapWords,
        Rule::EliminateDomainTerm,
        Rule::SoleSurvivor,
        Rule::NegativeQuestion,
        Rule::KeywordTiers,
        Rule::Parenthetical,
        Rule::Echo,
        Rule::DuplicateKeyword,
        Rule::LongestOption,
        Rule::LastResortKeywords,
        Rule::FirstLongest,
    ];

    /// Structural rules whose relative order the calibrator may change.
    pub const REORDERABLE: [Rule; 3] = [Rule::Parenthetical, Rule::Echo, Rule::DuplicateKeyword];

    pub fn id(&self) -> &'static str {
        match self {
            Rule::BinarySentiment => "binary-sentiment",
            Rule::UniversalQuantifier => "universal-quantifier",
            Rule::EliminateNone => "eliminate-none",
            Rule::EliminateVerbPrefix => "eliminate-verb-prefix",
            Rule::EliminateTrapWords => "eliminate-trap-words",
            Rule::EliminateDomainTerm => "eliminate-domain-term",
            Rule::SoleSurvivor => "sole-survivor",
            Rule::NegativeQuestion => "negative-question",
            Rule::KeywordTiers => "keyword-tiers",
            Rule::Parenthetical => "parenthetical",
            Rule::Echo => "echo",
            Rule::DuplicateKeyword => "duplicate-keyword",
            Rule::LongestOption => "longest-option",
            Rule::LastResortKeywords => "last-resort-keywords",
            Rule::FirstLongest => "first-longest",
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::EliminateNone
            | Rule::EliminateVerbPrefix
            | Rule::EliminateTrapWords
            | Rule::EliminateDomainTerm => RuleKind::Elimination,
            _ => RuleKind::Decision,
        }
    }

    /// Nominal confidence. Keyword tiers take their tier's level, the
    /// negative-question rule is certain on a tier-1 hit, and the longest
    /// option rule is downgraded after a none-style option was removed.
    pub fn confidence(&self) -> Confidence {
        match self {
            Rule::BinarySentiment
            | Rule::UniversalQuantifier
            | Rule::EliminateNone
            | Rule::EliminateVerbPrefix
            | Rule::EliminateTrapWords
            | Rule::EliminateDomainTerm
            | Rule::SoleSurvivor => Confidence::Certain,
            Rule::NegativeQuestion
            | Rule::KeywordTiers
            | Rule::Parenthetical
            | Rule::Echo
            | Rule::DuplicateKeyword
            | Rule::LongestOption => Confidence::Probable,
            Rule::LastResortKeywords | Rule::FirstLongest => Confidence::Gamble,
        }
    }

    /// Rules that read positive phrasing ("which of the following is ...")
    /// and must not run on a negative question.
    pub fn assumes_positive_phrasing(&self) -> bool {
        matches!(
            self,
            Rule::KeywordTiers
                | Rule::Parenthetical
                | Rule::Echo
                | Rule::DuplicateKeyword
                | Rule::LongestOption
                | Rule::LastResortKeywords
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub index: usize,
    pub confidence: Confidence,
    /// The keyword or word that decided the pick, if any.
    pub trigger: Option<String>,
}

impl Pick {
    fn new(index: usize, confidence: Confidence) -> Self {
        Self {
            index,
            confidence,
            trigger: None,
        }
    }

    fn with_trigger(mut self, trigger: &str) -> Self {
        self.trigger = Some(trigger.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoOpinion,
    /// The surviving candidates: a strict, non-empty subset of the live set.
    Narrowed(Vec<usize>),
    Pick(Pick),
}

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static OPTION_NEGATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bnot\b|\bcannot\b|\bcan\s+not\b").unwrap());

static UNIVERSAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\ball\s+(of\s+)?(the\s+)?(mentioned|above)\b").unwrap());

static NONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnone\b").unwrap());

pub fn is_universal_option(text: &str) -> bool {
    UNIVERSAL_RE.is_match(text)
}

pub fn is_none_option(text: &str) -> bool {
    NONE_RE.is_match(text)
}

pub fn is_negated_option(text: &str) -> bool {
    OPTION_NEGATION_RE.is_match(text)
}

pub fn has_parenthetical(text: &str) -> bool {
    text.contains('(') && text.contains(')')
}

// ---------------------------------------------------------------------------
// Question context
// ---------------------------------------------------------------------------

/// Per-question working state: cached lexical views of the question and its
/// options, plus the live candidate set the elimination passes narrow.
#[derive(Debug, Clone)]
pub struct QuestionContext<'q> {
    question: &'q Question,
    option_terms: Vec<Vec<String>>,
    option_words: Vec<BTreeSet<String>>,
    option_tokens: Vec<BTreeSet<String>>,
    option_lengths: Vec<usize>,
    question_terms: Vec<String>,
    question_tokens: BTreeSet<String>,
    live: Vec<usize>,
    none_removed: bool,
    negative: bool,
}

impl<'q> QuestionContext<'q> {
    pub fn new(question: &'q Question, library: &RuleLibrary) -> Self {
        let min_len = library.config.min_token_len;
        let options = question.options();
        let question_terms = term_words(question.text());
        let negative = library
            .negation_markers
            .iter()
            .any(|m| contains_term(&question_terms, m));

        Self {
            question,
            option_terms: options.iter().map(|o| term_words(&o.text)).collect(),
            option_words: options.iter().map(|o| words(&o.text)).collect(),
            option_tokens: options.iter().map(|o| tokens(&o.text, min_len)).collect(),
            option_lengths: options.iter().map(|o| word_count(&o.text)).collect(),
            question_tokens: tokens(question.text(), min_len),
            question_terms,
            live: (0..options.len()).collect(),
            none_removed: false,
            negative,
        }
    }

    pub fn question(&self) -> &'q Question {
        self.question
    }

    pub fn live(&self) -> &[usize] {
        &self.live
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn none_removed(&self) -> bool {
        self.none_removed
    }

    /// Apply an elimination result. `by` records which pass narrowed the
    /// set, since the longest-option rule reads whether "none" went.
    pub fn narrow(&mut self, survivors: Vec<usize>, by: Rule) {
        debug_assert!(!survivors.is_empty() && survivors.iter().all(|i| self.live.contains(i)));
        if by == Rule::EliminateNone {
            self.none_removed = true;
        }
        self.live = survivors;
    }

    fn text(&self, index: usize) -> &str {
        &self.question.options()[index].text
    }

    fn has_term(&self, index: usize, term: &[String]) -> bool {
        contains_term(&self.option_terms[index], term)
    }

    /// Live options holding `term`, in position order.
    fn holders(&self, term: &[String]) -> Vec<usize> {
        self.live
            .iter()
            .copied()
            .filter(|&i| self.has_term(i, term))
            .collect()
    }

    /// Keep the live options for which `remove` is false. `None` when the
    /// pass would remove nothing or everything.
    fn filter_live(&self, remove: impl Fn(usize) -> bool) -> Option<Vec<usize>> {
        let survivors: Vec<usize> = self.live.iter().copied().filter(|&i| !remove(i)).collect();
        if survivors.is_empty() || survivors.len() == self.live.len() {
            None
        } else {
            Some(survivors)
        }
    }

    /// First of `candidates` with the most words.
    fn longest_of(&self, candidates: &[usize]) -> Option<usize> {
        let max = candidates.iter().map(|&i| self.option_lengths[i]).max()?;
        candidates
            .iter()
            .copied()
            .find(|&i| self.option_lengths[i] == max)
    }
}

// ---------------------------------------------------------------------------
// Rule library
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CompiledKeyword {
    word: String,
    terms: Vec<String>,
}

impl CompiledKeyword {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            terms: term_words(word),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledTier {
    confidence: Confidence,
    keywords: Vec<CompiledKeyword>,
}

/// The ordered rule list plus the trigger data the rules need, split into
/// matchable word sequences once at construction. Read-only afterwards.
#[derive(Debug, Clone)]
pub struct RuleLibrary {
    config: CalibratedConfig,
    order: Vec<Rule>,
    tiers: Vec<CompiledTier>,
    trap_words: Vec<CompiledKeyword>,
    vetoes: BTreeMap<String, Vec<CompiledKeyword>>,
    verb_prefixes: Vec<CompiledKeyword>,
    domain_terms: Vec<(CompiledKeyword, String)>,
    negation_markers: Vec<Vec<String>>,
}

impl RuleLibrary {
    pub fn new(config: CalibratedConfig) -> Result<Self> {
        validate_order(&config.rule_priority_order)?;
        if config.min_token_len == 0 {
            return Err(Error::Config("min_token_len must be at least 1".into()));
        }

        let mut tier_defs: Vec<_> = config.keyword_tiers.iter().collect();
        tier_defs.sort_by_key(|t| t.level);
        let mut tiers = Vec::with_capacity(tier_defs.len());
        for t in tier_defs {
            let keywords = t
                .words
                .iter()
                .map(|k| compile_trigger(&k.word))
                .collect::<Result<Vec<_>>>()?;
            tiers.push(CompiledTier {
                confidence: t.confidence,
                keywords,
            });
        }

        let trap_words = config
            .trap_words
            .iter()
            .map(|w| compile_trigger(w))
            .collect::<Result<Vec<_>>>()?;

        let mut vetoes = BTreeMap::new();
        for veto in &config.keyword_vetoes {
            let losers_to = veto
                .loses_to
                .iter()
                .map(|w| compile_trigger(w))
                .collect::<Result<Vec<_>>>()?;
            vetoes.insert(veto.keyword.to_lowercase(), losers_to);
        }

        let verb_prefixes = config
            .verb_prefix_triggers
            .iter()
            .map(|w| compile_trigger(w))
            .collect::<Result<Vec<_>>>()?;

        let domain_terms = config
            .domain_terms
            .iter()
            .map(|d| Ok((compile_trigger(&d.term)?, d.topic_stem.to_lowercase())))
            .collect::<Result<Vec<_>>>()?;

        let negation_markers = config
            .question_negation_markers
            .iter()
            .map(|m| compile_trigger(m).map(|k| k.terms))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            order: config.rule_priority_order.clone(),
            config,
            tiers,
            trap_words,
            vetoes,
            verb_prefixes,
            domain_terms,
            negation_markers,
        })
    }

    pub fn config(&self) -> &CalibratedConfig {
        &self.config
    }

    /// Rules in evaluation order; a rule's priority is its position.
    pub fn rules(&self) -> &[Rule] {
        &self.order
    }

    pub fn priority(&self, rule: Rule) -> usize {
        self.order
            .iter()
            .position(|r| *r == rule)
            .unwrap_or(self.order.len())
    }

    pub fn context<'q>(&self, question: &'q Question) -> QuestionContext<'q> {
        QuestionContext::new(question, self)
    }

    pub fn apply(&self, rule: Rule, ctx: &QuestionContext<'_>) -> Outcome {
        match rule {
            Rule::BinarySentiment => self.binary_sentiment(ctx),
            Rule::UniversalQuantifier => self.universal_quantifier(ctx),
            Rule::EliminateNone => self.eliminate_none(ctx),
            Rule::EliminateVerbPrefix => self.eliminate_verb_prefix(ctx),
            Rule::EliminateTrapWords => self.eliminate_trap_words(ctx),
            Rule::EliminateDomainTerm => self.eliminate_domain_term(ctx),
            Rule::SoleSurvivor => self.sole_survivor(ctx),
            Rule::NegativeQuestion => self.negative_question(ctx),
            Rule::KeywordTiers => self.keyword_tiers(ctx, false),
            Rule::Parenthetical => self.parenthetical(ctx),
            Rule::Echo => self.echo(ctx),
            Rule::DuplicateKeyword => self.duplicate_keyword(ctx),
            Rule::LongestOption => self.longest_option(ctx),
            Rule::LastResortKeywords => self.keyword_tiers(ctx, true),
            Rule::FirstLongest => self.first_longest(ctx),
        }
    }

    // -----------------------------------------------------------------------
    // Decisive shortcuts
    // -----------------------------------------------------------------------

    fn binary_sentiment(&self, ctx: &QuestionContext<'_>) -> Outcome {
        if !ctx.question.is_binary() || ctx.live.len() != 2 {
            return Outcome::NoOpinion;
        }
        let negated: Vec<usize> = ctx
            .live
            .iter()
            .copied()
            .filter(|&i| is_negated_option(ctx.text(i)))
            .collect();
        match negated.as_slice() {
            [n] => {
                let other = ctx.live.iter().copied().find(|i| i != n);
                match other {
                    Some(index) => Outcome::Pick(Pick::new(index, Confidence::Certain)),
                    None => Outcome::NoOpinion,
                }
            }
            _ => Outcome::NoOpinion,
        }
    }

    fn universal_quantifier(&self, ctx: &QuestionContext<'_>) -> Outcome {
        ctx.live
            .iter()
            .copied()
            .find(|&i| is_universal_option(ctx.text(i)))
            .map_or(Outcome::NoOpinion, |i| {
                Outcome::Pick(Pick::new(i, Confidence::Certain))
            })
    }

    // -----------------------------------------------------------------------
    // Elimination passes
    // -----------------------------------------------------------------------

    fn eliminate_none(&self, ctx: &QuestionContext<'_>) -> Outcome {
        narrowed(ctx.filter_live(|i| is_none_option(ctx.text(i))))
    }

    fn eliminate_verb_prefix(&self, ctx: &QuestionContext<'_>) -> Outcome {
        narrowed(ctx.filter_live(|i| {
            let terms = &ctx.option_terms[i];
            self.verb_prefixes
                .iter()
                .any(|p| !p.terms.is_empty() && terms.starts_with(&p.terms))
        }))
    }

    fn eliminate_trap_words(&self, ctx: &QuestionContext<'_>) -> Outcome {
        narrowed(ctx.filter_live(|i| {
            let saved = self
                .tiers
                .iter()
                .filter(|t| t.confidence != Confidence::Gamble)
                .flat_map(|t| &t.keywords)
                .any(|k| ctx.has_term(i, &k.terms));
            if saved {
                return false;
            }
            self.trap_words.iter().any(|trap| {
                ctx.has_term(i, &trap.terms) && !contains_term(&ctx.question_terms, &trap.terms)
            })
        }))
    }

    fn eliminate_domain_term(&self, ctx: &QuestionContext<'_>) -> Outcome {
        if ctx.negative {
            return Outcome::NoOpinion;
        }
        let question_lower = ctx.question.text().to_lowercase();
        let active: Vec<&CompiledKeyword> = self
            .domain_terms
            .iter()
            .filter(|(_, stem)| !question_lower.contains(stem.as_str()))
            .map(|(term, _)| term)
            .collect();
        if active.is_empty() {
            return Outcome::NoOpinion;
        }
        narrowed(ctx.filter_live(|i| active.iter().any(|t| ctx.has_term(i, &t.terms))))
    }

    fn sole_survivor(&self, ctx: &QuestionContext<'_>) -> Outcome {
        match ctx.live.as_slice() {
            [only] => Outcome::Pick(Pick::new(*only, Confidence::Certain)),
            _ => Outcome::NoOpinion,
        }
    }

    // -----------------------------------------------------------------------
    // Negative questions
    // -----------------------------------------------------------------------

    fn negative_question(&self, ctx: &QuestionContext<'_>) -> Outcome {
        if !ctx.negative {
            return Outcome::NoOpinion;
        }

        let tier_one: Vec<&CompiledKeyword> = self
            .tiers
            .iter()
            .filter(|t| t.confidence == Confidence::Certain)
            .flat_map(|t| &t.keywords)
            .collect();
        let mut with_tier_one: Vec<(usize, &str)> = Vec::new();
        for &i in &ctx.live {
            if let Some(k) = tier_one.iter().find(|k| ctx.has_term(i, &k.terms)) {
                with_tier_one.push((i, k.word.as_str()));
            }
        }
        if let [(index, word)] = with_tier_one.as_slice() {
            return Outcome::Pick(Pick::new(*index, Confidence::Certain).with_trigger(word));
        }

        // Odd one out: fewest words, then fewest characters.
        ctx.live
            .iter()
            .copied()
            .min_by_key(|&i| (ctx.option_lengths[i], ctx.text(i).chars().count()))
            .map_or(Outcome::NoOpinion, |i| {
                Outcome::Pick(Pick::new(i, Confidence::Probable))
            })
    }

    // -----------------------------------------------------------------------
    // Keyword tiers
    // -----------------------------------------------------------------------

    fn keyword_tiers(&self, ctx: &QuestionContext<'_>, last_resort: bool) -> Outcome {
        let tiers = self
            .tiers
            .iter()
            .filter(|t| (t.confidence == Confidence::Gamble) == last_resort);
        for tier in tiers {
            for keyword in &tier.keywords {
                let holders = ctx.holders(&keyword.terms);
                let [index] = holders.as_slice() else {
                    continue;
                };
                if self.vetoed(keyword, ctx) {
                    tracing::debug!(
                        "question {}: keyword '{}' vetoed by a stronger competitor",
                        ctx.question.id(),
                        keyword.word
                    );
                    continue;
                }
                return Outcome::Pick(Pick::new(*index, tier.confidence).with_trigger(&keyword.word));
            }
        }
        Outcome::NoOpinion
    }

    fn vetoed(&self, keyword: &CompiledKeyword, ctx: &QuestionContext<'_>) -> bool {
        self.vetoes
            .get(&keyword.word.to_lowercase())
            .is_some_and(|competitors| {
                competitors
                    .iter()
                    .any(|c| ctx.live.iter().any(|&i| ctx.has_term(i, &c.terms)))
            })
    }

    // -----------------------------------------------------------------------
    // Structural rules
    // -----------------------------------------------------------------------

    fn parenthetical(&self, ctx: &QuestionContext<'_>) -> Outcome {
        let with_parens: Vec<usize> = ctx
            .live
            .iter()
            .copied()
            .filter(|&i| has_parenthetical(ctx.text(i)))
            .collect();
        if with_parens.is_empty() || with_parens.len() == ctx.live.len() {
            return Outcome::NoOpinion;
        }
        ctx.longest_of(&with_parens)
            .map_or(Outcome::NoOpinion, |i| {
                Outcome::Pick(Pick::new(i, Confidence::Probable))
            })
    }

    fn echo(&self, ctx: &QuestionContext<'_>) -> Outcome {
        let scores: Vec<(usize, usize)> = ctx
            .live
            .iter()
            .map(|&i| {
                let shared = ctx.option_tokens[i]
                    .intersection(&ctx.question_tokens)
                    .count();
                (i, shared)
            })
            .collect();
        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        if best == 0 {
            return Outcome::NoOpinion;
        }
        let winners: Vec<usize> = scores
            .iter()
            .filter(|(_, s)| *s == best)
            .map(|(i, _)| *i)
            .collect();
        match winners.as_slice() {
            [index] => {
                let echoed = ctx.option_tokens[*index]
                    .intersection(&ctx.question_tokens)
                    .next()
                    .map(String::as_str)
                    .unwrap_or_default();
                Outcome::Pick(Pick::new(*index, Confidence::Probable).with_trigger(echoed))
            }
            _ => Outcome::NoOpinion,
        }
    }

    fn duplicate_keyword(&self, ctx: &QuestionContext<'_>) -> Outcome {
        let holders_of = |word: &str| -> Vec<usize> {
            ctx.live
                .iter()
                .copied()
                .filter(|&i| ctx.option_words[i].contains(word))
                .collect()
        };

        for word in &self.config.golden_duplicate_words_any {
            let holders = holders_of(word);
            if holders.len() >= 2 && holders.len() < ctx.live.len() {
                if let Some(i) = ctx.longest_of(&holders) {
                    return Outcome::Pick(Pick::new(i, Confidence::Probable).with_trigger(word));
                }
            }
        }
        for word in &self.config.golden_duplicate_words {
            let holders = holders_of(word);
            if holders.len() == 2 {
                if let Some(i) = ctx.longest_of(&holders) {
                    return Outcome::Pick(Pick::new(i, Confidence::Probable).with_trigger(word));
                }
            }
        }
        Outcome::NoOpinion
    }

    fn longest_option(&self, ctx: &QuestionContext<'_>) -> Outcome {
        let Some(max) = ctx.live.iter().map(|&i| ctx.option_lengths[i]).max() else {
            return Outcome::NoOpinion;
        };
        let longest: Vec<usize> = ctx
            .live
            .iter()
            .copied()
            .filter(|&i| ctx.option_lengths[i] == max)
            .collect();
        match longest.as_slice() {
            [index] => {
                let confidence = if ctx.none_removed {
                    Confidence::Gamble
                } else {
                    Confidence::Probable
                };
                Outcome::Pick(Pick::new(*index, confidence))
            }
            _ => Outcome::NoOpinion,
        }
    }

    fn first_longest(&self, ctx: &QuestionContext<'_>) -> Outcome {
        ctx.longest_of(&ctx.live)
            .map_or(Outcome::NoOpinion, |i| {
                Outcome::Pick(Pick::new(i, Confidence::Gamble))
            })
    }
}

fn narrowed(survivors: Option<Vec<usize>>) -> Outcome {
    survivors.map_or(Outcome::NoOpinion, Outcome::Narrowed)
}

fn compile_trigger(word: &str) -> Result<CompiledKeyword> {
    let keyword = CompiledKeyword::new(word);
    if keyword.terms.is_empty() {
        return Err(Error::Config(format!(
            "trigger '{word}' contains no matchable words"
        )));
    }
    Ok(keyword)
}

/// Every rule exactly once, ending with the rule that always picks.
fn validate_order(order: &[Rule]) -> Result<()> {
    let mut seen = HashSet::new();
    for rule in order {
        if !seen.insert(*rule) {
            return Err(Error::Config(format!("rule '{rule}' listed twice")));
        }
    }
    if let Some(missing) = Rule::ALL.iter().find(|r| !seen.contains(r)) {
        return Err(Error::Config(format!("rule '{missing}' missing from priority order")));
    }
    if order.last() != Some(&Rule::FirstLongest) {
        return Err(Error::Config(format!(
            "priority order must end with '{}'",
            Rule::FirstLongest
        )));
    }
    Ok(())
}
