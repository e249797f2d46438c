use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::normalize::strip_label;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub correct: bool,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            text: text.into(),
            correct,
        }
    }
}

/// A validated question. Exactly one option is correct and there are
/// two (true/false) to four options; option labels are already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    id: u32,
    text: String,
    options: Vec<AnswerOption>,
    #[serde(skip)]
    correct_index: usize,
}

#[derive(Deserialize)]
struct RawQuestion {
    id: u32,
    text: String,
    options: Vec<AnswerOption>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = Error;

    fn try_from(raw: RawQuestion) -> Result<Self> {
        Question::new(raw.id, raw.text, raw.options)
    }
}

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

impl Question {
    pub fn new(id: u32, text: impl Into<String>, options: Vec<AnswerOption>) -> Result<Self> {
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return Err(Error::integrity(
                id,
                format!(
                    "expected {MIN_OPTIONS} to {MAX_OPTIONS} options, found {}",
                    options.len()
                ),
            ));
        }

        let options: Vec<AnswerOption> = options
            .into_iter()
            .map(|o| AnswerOption::new(strip_label(&o.text), o.correct))
            .collect();

        if let Some(pos) = options.iter().position(|o| o.text.is_empty()) {
            return Err(Error::integrity(id, format!("option {pos} has no text")));
        }

        let correct: Vec<usize> = options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.correct)
            .map(|(i, _)| i)
            .collect();
        let correct_index = match correct.as_slice() {
            [only] => *only,
            [] => return Err(Error::integrity(id, "no option marked correct")),
            many => {
                return Err(Error::integrity(
                    id,
                    format!("{} options marked correct", many.len()),
                ))
            }
        };

        Ok(Self {
            id,
            text: text.into().trim().to_string(),
            options,
            correct_index,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn is_binary(&self) -> bool {
        self.options.len() == 2
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a JSON corpus and reject it as a whole if any record is malformed
/// or an id repeats.
pub fn parse_corpus(json: &str, origin: &Path) -> Result<Vec<Question>> {
    let raw: Vec<RawQuestion> = serde_json::from_str(json).map_err(|source| Error::Json {
        path: origin.to_path_buf(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raw.len());
    for record in raw {
        if !seen.insert(record.id) {
            return Err(Error::integrity(record.id, "duplicate question id"));
        }
        questions.push(Question::try_from(record)?);
    }
    Ok(questions)
}

pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Question>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let questions = parse_corpus(&json, path)?;
    tracing::info!("Loaded {} questions from {}", questions.len(), path.display());
    Ok(questions)
}
