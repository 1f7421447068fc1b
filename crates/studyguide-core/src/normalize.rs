//! Question-bank normalizer.
//!
//! Accepts a JSON document of unknown shape and converts it into canonical
//! [`Question`]s. Field names are resolved through the ordered alias lists
//! below: each alias is tried exactly, then case-insensitively, before moving
//! on to the next one. Malformed entries are dropped with a warning; a bank
//! is only an error when nothing usable is left.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::QuizError;
use crate::model::{AnswerOption, IndexBase, Question, MAX_OPTIONS, MIN_OPTIONS, OPTION_LETTERS};

/// Wrapper fields that may hold the question array.
pub const WRAPPER_KEYS: &[&str] = &[
    "questions",
    "items",
    "data",
    "bank",
    "quiz",
    "cards",
    "entries",
    "records",
];

/// Question identifier aliases.
pub const ID_KEYS: &[&str] = &["id", "question_id", "questionId", "qid", "uid"];

/// Question text aliases.
pub const STEM_KEYS: &[&str] = &[
    "question",
    "stem",
    "prompt",
    "q",
    "text",
    "question_text",
    "questionText",
    "title",
];

/// Fields holding the options as an array.
pub const OPTION_ARRAY_KEYS: &[&str] = &[
    "options",
    "choices",
    "answers",
    "answer_options",
    "answerOptions",
];

/// Text fields of an option given as an object.
pub const OPTION_TEXT_KEYS: &[&str] = &["text", "label", "value", "option", "answer", "content"];

/// Flags marking an option object as correct.
pub const OPTION_FLAG_KEYS: &[&str] = &["correct", "is_correct", "isCorrect"];

/// Correct-answer aliases.
pub const CORRECT_KEYS: &[&str] = &[
    "correct",
    "correct_answer",
    "correctAnswer",
    "correct_answers",
    "correctAnswers",
    "correct_letters",
    "correctLetters",
    "answer",
    "key",
    "solution",
    "answers",
];

/// Rationale aliases.
pub const RATIONALE_KEYS: &[&str] = &[
    "rationale",
    "explanation",
    "rational",
    "reason",
    "feedback",
    "why",
];

/// Question type aliases.
pub const TYPE_KEYS: &[&str] = &["type", "question_type", "questionType", "kind"];

const MULTI_TYPES: &[&str] = &[
    "multi_select",
    "multiselect",
    "multi",
    "multiple",
    "multiple_select",
    "multiple_response",
    "checkbox",
    "select_all",
    "sata",
];

const SINGLE_TYPES: &[&str] = &[
    "single_select",
    "single",
    "radio",
    "multiple_choice",
    "mcq",
];

/// Stem used when an entry has no recognizable question text.
pub const STEM_PLACEHOLDER: &str = "(No question text found)";

const MAX_WRAPPER_DEPTH: usize = 4;

/// Options controlling normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// How numeric correct-answer indices are interpreted.
    pub index_base: IndexBase,
}

/// A data-quality warning raised while normalizing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeWarning {
    /// Position of the entry in the source array.
    pub index: usize,
    /// Question id, when one was resolved.
    pub id: Option<String>,
    /// Warning message.
    pub message: String,
    /// Whether the entry was dropped.
    pub dropped: bool,
}

/// The result of normalizing a bank, with diagnostics.
#[derive(Debug, Clone)]
pub struct NormalizedBank {
    /// Usable questions, in source order.
    pub questions: Vec<Question>,
    /// Number of candidate entries found in the document.
    pub candidates: usize,
    /// Data-quality warnings, in source order.
    pub warnings: Vec<NormalizeWarning>,
}

impl NormalizedBank {
    /// Number of entries that were dropped.
    pub fn dropped(&self) -> usize {
        self.warnings.iter().filter(|w| w.dropped).count()
    }
}

/// Normalize a raw JSON document with the default options.
pub fn normalize(raw: &Value) -> Result<Vec<Question>, QuizError> {
    normalize_with(raw, &NormalizeOptions::default()).map(|bank| bank.questions)
}

/// Normalize a raw JSON document, keeping per-entry diagnostics.
pub fn normalize_with(raw: &Value, options: &NormalizeOptions) -> Result<NormalizedBank, QuizError> {
    let candidates = find_candidates(raw, 0).unwrap_or_default();
    let mut questions = Vec::with_capacity(candidates.len());
    let mut warnings = Vec::new();
    let mut seen_ids: HashMap<String, usize> = HashMap::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let Some(obj) = candidate.as_object() else {
            tracing::warn!("dropping entry {index}: not an object");
            warnings.push(NormalizeWarning {
                index,
                id: None,
                message: "entry is not an object".into(),
                dropped: true,
            });
            continue;
        };

        let mut notes = Vec::new();
        match normalize_entry(obj, options, &mut notes) {
            Ok(mut question) => {
                let count = seen_ids.entry(question.id.clone()).or_insert(0);
                *count += 1;
                if *count > 1 {
                    let renamed = format!("{}-{}", question.id, count);
                    notes.push(format!("duplicate id {}, renamed to {renamed}", question.id));
                    question.id = renamed;
                }
                for message in notes {
                    tracing::warn!("entry {index} ({}): {message}", question.id);
                    warnings.push(NormalizeWarning {
                        index,
                        id: Some(question.id.clone()),
                        message,
                        dropped: false,
                    });
                }
                questions.push(question);
            }
            Err(reason) => {
                tracing::warn!("dropping entry {index}: {reason}");
                let id = lookup(obj, ID_KEYS, &[]).and_then(|(_, v)| value_text(v));
                warnings.push(NormalizeWarning {
                    index,
                    id,
                    message: reason,
                    dropped: true,
                });
            }
        }
    }

    if questions.is_empty() {
        return Err(QuizError::EmptyBank);
    }

    Ok(NormalizedBank {
        questions,
        candidates: candidates.len(),
        warnings,
    })
}

/// Parse a JSON string into a normalized bank.
pub fn parse_bank_str(
    content: &str,
    source_path: &Path,
    options: &NormalizeOptions,
) -> Result<NormalizedBank> {
    let raw: Value = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
    let bank = normalize_with(&raw, options)
        .with_context(|| format!("no usable questions in {}", source_path.display()))?;
    Ok(bank)
}

/// Load and normalize a single bank file.
pub fn load_bank_file(path: &Path, options: &NormalizeOptions) -> Result<NormalizedBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;
    parse_bank_str(&content, path, options)
}

/// A bank loaded from disk.
#[derive(Debug, Clone)]
pub struct LoadedBank {
    /// File the bank was read from.
    pub path: PathBuf,
    /// The normalized bank.
    pub bank: NormalizedBank,
}

/// Recursively load every `.json` bank in a directory, skipping unusable files.
pub fn load_bank_directory(dir: &Path, options: &NormalizeOptions) -> Result<Vec<LoadedBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_bank_directory(&path, options)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match load_bank_file(&path, options) {
                Ok(bank) => banks.push(LoadedBank { path, bank }),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

// ---------------------------------------------------------------------------
// Candidate extraction
// ---------------------------------------------------------------------------

fn find_candidates(value: &Value, depth: usize) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => {
            for key in WRAPPER_KEYS {
                let Some((_, inner)) = lookup(map, &[*key], &[]) else {
                    continue;
                };
                match inner {
                    Value::Array(items) => return Some(items.iter().collect()),
                    Value::Object(_) if depth < MAX_WRAPPER_DEPTH => {
                        if let Some(found) = find_candidates(inner, depth + 1) {
                            if !found.is_empty() {
                                return Some(found);
                            }
                        }
                    }
                    _ => {}
                }
            }

            if looks_like_question(map) {
                return Some(vec![value]);
            }

            if let Some(items) = map.values().find_map(|v| match v {
                Value::Array(items) if items.iter().any(Value::is_object) => Some(items),
                _ => None,
            }) {
                return Some(items.iter().collect());
            }

            map.values()
                .find(|v| v.as_object().is_some_and(looks_like_question))
                .map(|v| vec![v])
        }
        _ => None,
    }
}

fn looks_like_question(map: &Map<String, Value>) -> bool {
    let lettered = lookup(map, &["A"], &[]).is_some() && lookup(map, &["B"], &[]).is_some();
    let arrayed = lookup(map, OPTION_ARRAY_KEYS, &[]).is_some_and(|(_, v)| v.is_array())
        && lookup(map, STEM_KEYS, &[]).is_some();
    lettered || arrayed
}

// ---------------------------------------------------------------------------
// Entry normalization
// ---------------------------------------------------------------------------

/// An option as found in the source, before letters are reassigned.
struct RawOption {
    /// Letter the source used for this option.
    key: Option<char>,
    text: String,
    flagged_correct: bool,
}

fn normalize_entry(
    obj: &Map<String, Value>,
    options: &NormalizeOptions,
    notes: &mut Vec<String>,
) -> std::result::Result<Question, String> {
    let mut consumed: Vec<&str> = Vec::new();

    let stem = match lookup_text(obj, STEM_KEYS, &[]) {
        Some((key, text)) => {
            consumed.push(key);
            text
        }
        None => {
            notes.push("no question text found".into());
            STEM_PLACEHOLDER.to_string()
        }
    };

    let explicit_id = lookup_text(obj, ID_KEYS, &[]).map(|(key, text)| {
        consumed.push(key);
        text
    });
    let rationale = lookup_text(obj, RATIONALE_KEYS, &[])
        .map(|(key, text)| {
            consumed.push(key);
            text
        })
        .unwrap_or_default();
    let declared_type = lookup_text(obj, TYPE_KEYS, &[]).map(|(key, text)| {
        consumed.push(key);
        text
    });

    let (mut raw_options, options_key) = resolve_options(obj, &consumed);
    if raw_options.len() < MIN_OPTIONS {
        return Err(format!(
            "only {} resolvable option(s), need at least {MIN_OPTIONS}",
            raw_options.len()
        ));
    }
    if raw_options.len() > MAX_OPTIONS {
        notes.push(format!(
            "{} options found, keeping the first {MAX_OPTIONS}",
            raw_options.len()
        ));
        raw_options.truncate(MAX_OPTIONS);
    }

    let mut skip: Vec<&str> = Vec::new();
    if let Some(key) = options_key.as_deref() {
        skip.push(key);
    }
    let mut positions: BTreeSet<usize> = raw_options
        .iter()
        .enumerate()
        .filter(|(_, o)| o.flagged_correct)
        .map(|(i, _)| i)
        .collect();
    if let Some((_, value)) = lookup(obj, CORRECT_KEYS, &skip) {
        positions.extend(resolve_correct(value, &raw_options, options.index_base));
    }
    if positions.is_empty() {
        return Err("no resolvable correct answer".into());
    }

    let answer_options: Vec<AnswerOption> = raw_options
        .into_iter()
        .zip(OPTION_LETTERS)
        .map(|(o, letter)| AnswerOption {
            letter,
            text: o.text,
        })
        .collect();
    let correct_letters: BTreeSet<char> = positions.iter().map(|&i| OPTION_LETTERS[i]).collect();

    let is_multi_select = match declared_type.as_deref().map(type_token) {
        Some(t) if MULTI_TYPES.contains(&t.as_str()) => true,
        Some(t) if SINGLE_TYPES.contains(&t.as_str()) => {
            if correct_letters.len() > 1 {
                notes.push(format!(
                    "declared single-select but has {} correct answers",
                    correct_letters.len()
                ));
            }
            correct_letters.len() > 1
        }
        _ => correct_letters.len() > 1,
    };

    let id = explicit_id.unwrap_or_else(|| content_id(&stem, &answer_options));

    Ok(Question {
        id,
        stem,
        options: answer_options,
        correct_letters,
        is_multi_select,
        rationale,
    })
}

fn type_token(declared: &str) -> String {
    declared.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Deterministic id from the question content.
fn content_id(stem: &str, options: &[AnswerOption]) -> String {
    let mut input = String::from(stem);
    for option in options {
        input.push('\u{1f}');
        input.push_str(&option.text);
    }
    format!("q-{:016x}", xxh3_64(input.as_bytes()))
}

fn resolve_options(obj: &Map<String, Value>, consumed: &[&str]) -> (Vec<RawOption>, Option<String>) {
    if let Some((key, Value::Array(items))) = lookup(obj, OPTION_ARRAY_KEYS, consumed) {
        let options: Vec<RawOption> = items
            .iter()
            .filter_map(option_from_item)
            .enumerate()
            .map(|(i, (text, flagged_correct))| RawOption {
                key: OPTION_LETTERS.get(i).copied(),
                text,
                flagged_correct,
            })
            .collect();
        if options.len() >= MIN_OPTIONS {
            return (options, Some(key.to_string()));
        }
    }

    let options = lettered_options(obj, consumed);
    if options.len() >= MIN_OPTIONS {
        (options, None)
    } else {
        (Vec::new(), None)
    }
}

fn option_from_item(item: &Value) -> Option<(String, bool)> {
    match item {
        Value::Object(map) => {
            let (_, text) = lookup_text(map, OPTION_TEXT_KEYS, &[])?;
            let flagged = lookup(map, OPTION_FLAG_KEYS, &[]).is_some_and(|(_, v)| truthy(v));
            Some((text, flagged))
        }
        other => value_text(other).map(|text| (text, false)),
    }
}

fn lettered_options(obj: &Map<String, Value>, consumed: &[&str]) -> Vec<RawOption> {
    let mut options = Vec::new();
    for (i, letter) in OPTION_LETTERS.iter().enumerate() {
        let n = i + 1;
        let names = [
            letter.to_string(),
            format!("option{letter}"),
            format!("option_{letter}"),
            format!("option{n}"),
            format!("option_{n}"),
            format!("choice{letter}"),
            format!("choice_{letter}"),
            format!("choice{n}"),
        ];
        let keys: Vec<&str> = names.iter().map(String::as_str).collect();
        if let Some((_, text)) = lookup_text(obj, &keys, consumed) {
            options.push(RawOption {
                key: Some(*letter),
                text,
                flagged_correct: false,
            });
        }
    }
    options
}

// ---------------------------------------------------------------------------
// Correct-answer resolution
// ---------------------------------------------------------------------------

fn resolve_correct(value: &Value, options: &[RawOption], base: IndexBase) -> BTreeSet<usize> {
    match value {
        Value::String(s) => resolve_correct_text(s, options, base),
        Value::Number(_) => index_position(value, options, base).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .flat_map(|item| match item {
                Value::Object(map) => lookup_text(map, OPTION_TEXT_KEYS, &[])
                    .map(|(_, text)| resolve_correct_text(&text, options, base))
                    .unwrap_or_default(),
                Value::Array(_) => BTreeSet::new(),
                other => resolve_correct(other, options, base),
            })
            .collect(),
        _ => BTreeSet::new(),
    }
}

fn resolve_correct_text(s: &str, options: &[RawOption], base: IndexBase) -> BTreeSet<usize> {
    let s = s.trim();
    if s.is_empty() {
        return BTreeSet::new();
    }

    let tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/' | '&' | '|'))
        .map(|t| t.trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | '.' | ':' | '"' | '\'')))
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("and"))
        .collect();

    if !tokens.is_empty() && tokens.iter().all(|t| is_letter_token(t) || is_index_token(t)) {
        let positions: BTreeSet<usize> = tokens
            .iter()
            .filter_map(|t| {
                if is_letter_token(t) {
                    letter_position(t, options)
                } else {
                    t.parse::<u64>()
                        .ok()
                        .and_then(|n| base.to_position(n))
                        .filter(|&p| p < options.len())
                }
            })
            .collect();
        if !positions.is_empty() {
            return positions;
        }
    }

    if let Some(pos) = options.iter().position(|o| o.text.eq_ignore_ascii_case(s)) {
        return BTreeSet::from([pos]);
    }

    // "B. Aspirin" / "B) Aspirin"
    let mut chars = s.chars();
    if let (Some(first), Some(sep)) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() && matches!(sep, '.' | ')' | ':') {
            let label = first.to_string();
            return letter_position(&label, options).into_iter().collect();
        }
    }

    BTreeSet::new()
}

fn is_letter_token(t: &str) -> bool {
    let mut chars = t.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

fn is_index_token(t: &str) -> bool {
    !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())
}

fn letter_position(token: &str, options: &[RawOption]) -> Option<usize> {
    let letter = token.chars().next()?.to_ascii_uppercase();
    options.iter().position(|o| o.key == Some(letter))
}

fn index_position(value: &Value, options: &[RawOption], base: IndexBase) -> Option<usize> {
    let index = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f < 0.0 || f.fract() != 0.0 {
                return None;
            }
            f as u64
        }
    };
    base.to_position(index).filter(|&p| p < options.len())
}

// ---------------------------------------------------------------------------
// Field lookup helpers
// ---------------------------------------------------------------------------

/// First non-null field among `keys`, skipping any key in `skip`.
fn lookup<'a>(
    map: &'a Map<String, Value>,
    keys: &[&str],
    skip: &[&str],
) -> Option<(&'a str, &'a Value)> {
    let skipped = |k: &str| skip.iter().any(|s| s.eq_ignore_ascii_case(k));
    for key in keys {
        if let Some((k, v)) = map
            .iter()
            .find(|(k, v)| k.as_str() == *key && !v.is_null() && !skipped(k))
        {
            return Some((k.as_str(), v));
        }
        if let Some((k, v)) = map
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.is_null() && !skipped(k))
        {
            return Some((k.as_str(), v));
        }
    }
    None
}

/// First field among `keys` that yields non-empty text.
fn lookup_text<'a>(
    map: &'a Map<String, Value>,
    keys: &[&str],
    skip: &[&str],
) -> Option<(&'a str, String)> {
    keys.iter().find_map(|key| {
        let (k, v) = lookup(map, &[*key], skip)?;
        value_text(v).map(|text| (k, text))
    })
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "y" | "1"),
        _ => false,
    }
}
