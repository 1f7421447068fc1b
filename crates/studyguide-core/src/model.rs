//! Core data model types for studyguide.
//!
//! These are the canonical types every bank is normalized into, plus the
//! small value types a caller uses to configure a run.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// Letters assigned to options by position.
pub const OPTION_LETTERS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Minimum number of options a question must have.
pub const MIN_OPTIONS: usize = 2;

/// Maximum number of options a question may have.
pub const MAX_OPTIONS: usize = OPTION_LETTERS.len();

/// Run lengths offered by the launcher.
pub const LENGTH_PRESETS: [RunLength; 5] = [
    RunLength::Count(10),
    RunLength::Count(25),
    RunLength::Count(50),
    RunLength::Count(100),
    RunLength::Full,
];

/// One lettered answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Display letter (`A`, `B`, ...).
    pub letter: char,
    /// Option text.
    pub text: String,
}

/// A normalized question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier (explicit or content hash).
    pub id: String,
    /// Question text, trimmed and non-empty.
    pub stem: String,
    /// Options lettered by position.
    pub options: Vec<AnswerOption>,
    /// Letters of the correct options; never empty.
    pub correct_letters: BTreeSet<char>,
    /// Whether the question should be answered with a multi-select widget.
    pub is_multi_select: bool,
    /// Explanation shown after grading.
    #[serde(default)]
    pub rationale: String,
}

impl Question {
    /// Look up an option by letter (case-insensitive).
    pub fn option(&self, letter: char) -> Option<&AnswerOption> {
        let letter = letter.to_ascii_uppercase();
        self.options.iter().find(|o| o.letter == letter)
    }

    /// The correct options, in letter order.
    pub fn correct_options(&self) -> Vec<AnswerOption> {
        self.options
            .iter()
            .filter(|o| self.correct_letters.contains(&o.letter))
            .cloned()
            .collect()
    }

    /// Whether `letters` is exactly the correct set.
    pub fn is_correct(&self, letters: &BTreeSet<char>) -> bool {
        *letters == self.correct_letters
    }
}

/// How many questions to draw for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunLength {
    /// The whole bank, shuffled.
    Full,
    /// A fixed number of questions.
    Count(usize),
}

impl Default for RunLength {
    fn default() -> Self {
        RunLength::Count(10)
    }
}

impl fmt::Display for RunLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunLength::Full => write!(f, "full"),
            RunLength::Count(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for RunLength {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "full" | "all" | "-1" => Ok(RunLength::Full),
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Ok(RunLength::Count(n)),
                _ => Err(QuizError::InvalidLength(trimmed.to_string())),
            },
        }
    }
}

/// Convention for numeric correct-answer indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBase {
    /// `0` refers to the first option.
    #[default]
    Zero,
    /// `1` refers to the first option.
    One,
}

impl IndexBase {
    /// Convert a source index to a 0-based option position.
    pub fn to_position(self, index: u64) -> Option<usize> {
        let index = usize::try_from(index).ok()?;
        match self {
            IndexBase::Zero => Some(index),
            IndexBase::One => index.checked_sub(1),
        }
    }
}

impl FromStr for IndexBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "zero" => Ok(IndexBase::Zero),
            "1" | "one" => Ok(IndexBase::One),
            other => Err(format!("unknown index base: {other}")),
        }
    }
}
