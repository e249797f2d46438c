//! Calibrated configuration consumed by the rule library.
//!
//! The defaults reproduce the reference calibration of the 180-question
//! operating-systems bank. [`crate::calibrate::Calibrator`] regenerates the
//! corpus-derived parts (tiers, trap words, duplicate words, rule order) and
//! carries the rest forward from a base config.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::normalize::DEFAULT_MIN_TOKEN_LEN;
use crate::rules::{Confidence, Rule};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierKeyword {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
}

impl TierKeyword {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            hit_rate: None,
            samples: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTier {
    pub level: u8,
    pub confidence: Confidence,
    pub words: Vec<TierKeyword>,
}

/// A tier keyword that yields when any live option carries one of
/// `loses_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordVeto {
    pub keyword: String,
    pub loses_to: Vec<String>,
}

/// An option term that is usually wrong unless the question itself is about
/// `topic_stem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTerm {
    pub term: String,
    pub topic_stem: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedConfig {
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    pub trap_words: BTreeSet<String>,
    pub keyword_tiers: Vec<KeywordTier>,
    /// Decisive only when held by exactly two live options.
    pub golden_duplicate_words: BTreeSet<String>,
    /// Decisive when held by two or more, but not all, live options.
    #[serde(default)]
    pub golden_duplicate_words_any: BTreeSet<String>,
    #[serde(default)]
    pub keyword_vetoes: Vec<KeywordVeto>,
    #[serde(default)]
    pub verb_prefix_triggers: BTreeSet<String>,
    #[serde(default)]
    pub domain_terms: Vec<DomainTerm>,
    #[serde(default = "default_negation_markers")]
    pub question_negation_markers: BTreeSet<String>,
    pub rule_priority_order: Vec<Rule>,
}

fn default_min_token_len() -> usize {
    DEFAULT_MIN_TOKEN_LEN
}

fn default_negation_markers() -> BTreeSet<String> {
    set(&["not"])
}

fn set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn tier(level: u8, confidence: Confidence, words: &[&str]) -> KeywordTier {
    KeywordTier {
        level,
        confidence,
        words: words.iter().map(|w| TierKeyword::new(*w)).collect(),
    }
}

impl Default for CalibratedConfig {
    fn default() -> Self {
        Self {
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            trap_words: set(&[
                "single",
                "allocates",
                "prevention",
                "prevent",
                "prevents",
                "preventing",
                "prevented",
                "reduce",
                "reduces",
                "reduced",
                "reducing",
                "reduction",
                "macos",
                "segmentation",
                "deadlocks",
                "speed",
                "manager",
                "memory",
            ]),
            keyword_tiers: vec![
                tier(
                    1,
                    Confidence::Certain,
                    &[
                        "circular",
                        "unauthorized",
                        "wait",
                        "pages",
                        "switching",
                        "than",
                        "create",
                        "web",
                        "allows",
                        "among",
                        "highest",
                    ],
                ),
                tier(
                    2,
                    Confidence::Probable,
                    &["ready", "each", "compiling", "part", "executing"],
                ),
                tier(
                    3,
                    Confidence::Gamble,
                    &[
                        "all",
                        "data",
                        "scheduler",
                        "more",
                        "about",
                        "stores",
                        "ntfs",
                        "collection",
                        "response",
                        "physical",
                        "hard",
                        "share",
                        "accounting",
                        "metadata",
                        "managing",
                    ],
                ),
            ],
            golden_duplicate_words: set(&["cpu", "file", "threads"]),
            golden_duplicate_words_any: set(&["process"]),
            keyword_vetoes: vec![KeywordVeto {
                keyword: "each".to_string(),
                loses_to: vec!["share".to_string(), "among".to_string()],
            }],
            verb_prefix_triggers: set(&["schedules"]),
            domain_terms: vec![DomainTerm {
                term: "scheduling".to_string(),
                topic_stem: "schedul".to_string(),
            }],
            question_negation_markers: default_negation_markers(),
            rule_priority_order: Rule::ALL.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

impl CalibratedConfig {
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

    /// Pretty JSON with a trailing newline. Sets serialize sorted, so two
    /// equal configs always produce identical bytes.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            path: "<config>".into(),
            source,
        })?;
        json.push('\n');
        Ok(json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Keywords of every tier at or above `confidence`, in tier order.
    pub fn keywords_at_least(&self, confidence: Confidence) -> impl Iterator<Item = &str> {
        self.keyword_tiers
            .iter()
            .filter(move |t| t.confidence <= confidence)
            .flat_map(|t| t.words.iter().map(|k| k.word.as_str()))
    }
}
