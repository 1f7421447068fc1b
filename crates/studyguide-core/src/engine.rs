//! Until-mastery quiz run engine.
//!
//! Owns one session at a time: samples a run set from a bank, presents one
//! question at a time, grades submissions, and recycles misses until every
//! question in the run set has been answered correctly at least once.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuizError;
use crate::model::{AnswerOption, Question, RunLength};
use crate::normalize::{normalize_with, NormalizeOptions};
use crate::report::{percent, RunSummary};

/// What happens to a question after it is graded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RecyclePolicy {
    /// Every miss goes back to the end of the work queue.
    #[default]
    Always,
    /// Misses and hits are re-queued with the given probabilities. Misses
    /// that are not re-queued come back through the refill.
    Reinforce {
        #[serde(default = "default_miss_chance")]
        miss_chance: f64,
        #[serde(default = "default_hit_chance")]
        hit_chance: f64,
    },
}

fn default_miss_chance() -> f64 {
    0.15
}

fn default_hit_chance() -> f64 {
    0.05
}

impl RecyclePolicy {
    /// The reinforcement variant with its usual probabilities.
    pub fn reinforce() -> Self {
        RecyclePolicy::Reinforce {
            miss_chance: default_miss_chance(),
            hit_chance: default_hit_chance(),
        }
    }

    /// Check that the policy keeps the run terminating.
    ///
    /// A miss may always be re-queued, but a hit must eventually stick.
    pub fn validate(&self) -> Result<(), QuizError> {
        match *self {
            RecyclePolicy::Always => Ok(()),
            RecyclePolicy::Reinforce {
                miss_chance,
                hit_chance,
            } => {
                if !(0.0..=1.0).contains(&miss_chance) {
                    return Err(QuizError::InvalidPolicy(format!(
                        "miss_chance must be within 0.0..=1.0, got {miss_chance}"
                    )));
                }
                if !(0.0..1.0).contains(&hit_chance) {
                    return Err(QuizError::InvalidPolicy(format!(
                        "hit_chance must be within 0.0..1.0, got {hit_chance}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    NotStarted,
    InProgress,
    Completed,
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    pub question_id: String,
    pub is_correct: bool,
    /// Letters as submitted, upper-cased.
    pub selected: BTreeSet<char>,
    pub correct_letters: BTreeSet<char>,
    /// Correct letters with their option text.
    pub correct_options: Vec<AnswerOption>,
    pub rationale: String,
    /// Whether this was the first submission ever for the question.
    pub first_attempt: bool,
}

/// Header counters for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Presentations so far, repeats included.
    pub presented: usize,
    /// Distinct questions shown at least once.
    pub unique_seen: usize,
    pub mastered: usize,
    /// Questions still to master.
    pub remaining: usize,
    pub total: usize,
    pub percent_mastered: u32,
}

/// What `advance` produced.
#[derive(Debug, Clone)]
pub enum Advance {
    Next(Question),
    Completed(RunSummary),
}

/// A question ready to display, with its header counters.
#[derive(Debug, Clone)]
pub struct QuestionView {
    pub question: Question,
    pub progress: Progress,
    /// Earlier submissions for this question in the session.
    pub previous_attempts: u32,
}

/// Mutable per-session state.
#[derive(Debug)]
struct RunState {
    run_set: Vec<Question>,
    work_queue: VecDeque<usize>,
    mastered: HashSet<String>,
    first_try_correct: HashSet<String>,
    attempt_counts: HashMap<String, u32>,
    unique_seen: HashSet<String>,
    current: Option<usize>,
    graded: bool,
    presented_count: usize,
}

impl RunState {
    fn new(run_set: Vec<Question>, work_queue: VecDeque<usize>) -> Self {
        Self {
            run_set,
            work_queue,
            mastered: HashSet::new(),
            first_try_correct: HashSet::new(),
            attempt_counts: HashMap::new(),
            unique_seen: HashSet::new(),
            current: None,
            graded: false,
            presented_count: 0,
        }
    }

    fn present(&mut self, index: usize) {
        self.current = Some(index);
        self.graded = false;
        self.presented_count += 1;
        self.unique_seen.insert(self.run_set[index].id.clone());
    }

    fn current_question(&self) -> Option<&Question> {
        self.current.map(|i| &self.run_set[i])
    }

    fn progress(&self) -> Progress {
        let total = self.run_set.len();
        Progress {
            presented: self.presented_count,
            unique_seen: self.unique_seen.len(),
            mastered: self.mastered.len(),
            remaining: total - self.mastered.len(),
            total,
            percent_mastered: percent(self.mastered.len(), total),
        }
    }
}

/// Drives one quiz session end-to-end.
pub struct QuizRunEngine<R: Rng = StdRng> {
    rng: R,
    policy: RecyclePolicy,
    normalize_options: NormalizeOptions,
    module: Option<String>,
    phase: RunPhase,
    state: Option<RunState>,
}

impl QuizRunEngine<StdRng> {
    /// Engine with a reproducible random source.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Engine seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> QuizRunEngine<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            policy: RecyclePolicy::default(),
            normalize_options: NormalizeOptions::default(),
            module: None,
            phase: RunPhase::NotStarted,
            state: None,
        }
    }

    /// Set the recycle policy, rejecting probabilities that could panic or never finish.
    pub fn with_policy(mut self, policy: RecyclePolicy) -> Result<Self, QuizError> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize_options = options;
        self
    }

    /// Label recorded in the run summary.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn policy(&self) -> RecyclePolicy {
        self.policy
    }

    /// Normalize `raw` and start a session on it.
    pub fn start(&mut self, raw: &Value, length: RunLength) -> Result<&Question, QuizError> {
        validate_length(length)?;
        let bank = normalize_with(raw, &self.normalize_options)?;
        self.start_bank(bank.questions, length)
    }

    /// Start a session on an already-normalized bank.
    ///
    /// Any previous session is discarded. Repeated ids are suffixed so each
    /// question is tracked on its own.
    pub fn start_bank(
        &mut self,
        mut bank: Vec<Question>,
        length: RunLength,
    ) -> Result<&Question, QuizError> {
        validate_length(length)?;
        if bank.is_empty() {
            return Err(QuizError::EmptyBank);
        }
        dedupe_ids(&mut bank);

        match length {
            RunLength::Count(n) if n < bank.len() => {
                // Partial Fisher-Yates: the first `n` slots end up uniformly sampled.
                for i in 0..n {
                    let j = self.rng.gen_range(i..bank.len());
                    bank.swap(i, j);
                }
                bank.truncate(n);
            }
            _ => bank.shuffle(&mut self.rng),
        }

        let mut order: Vec<usize> = (0..bank.len()).collect();
        order.shuffle(&mut self.rng);
        let mut work_queue: VecDeque<usize> = order.into();

        let first = work_queue.pop_front().ok_or(QuizError::EmptyBank)?;
        let mut state = RunState::new(bank, work_queue);
        state.present(first);

        tracing::debug!(
            "run started with {} question(s), length {length}",
            state.run_set.len()
        );
        self.phase = RunPhase::InProgress;
        let state = self.state.insert(state);
        state.current_question().ok_or(QuizError::EmptyBank)
    }

    /// Grade the current question against `selected`.
    pub fn submit<I>(&mut self, selected: I) -> Result<GradeResult, QuizError>
    where
        I: IntoIterator<Item = char>,
    {
        if self.phase != RunPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }
        let state = self.state.as_mut().ok_or(QuizError::NotInProgress)?;
        let index = state.current.ok_or(QuizError::NotInProgress)?;

        let selected: BTreeSet<char> = selected
            .into_iter()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if selected.is_empty() {
            return Err(QuizError::NoSelection);
        }
        if state.graded {
            return Err(QuizError::AlreadyGraded);
        }

        let question = &state.run_set[index];
        let id = question.id.clone();
        let is_correct = question.is_correct(&selected);

        let attempts = state.attempt_counts.entry(id.clone()).or_insert(0);
        *attempts += 1;
        let first_attempt = *attempts == 1;

        if first_attempt && is_correct {
            state.first_try_correct.insert(id.clone());
        }

        let requeue = match (self.policy, is_correct) {
            (RecyclePolicy::Always, correct) => !correct,
            (RecyclePolicy::Reinforce { miss_chance, .. }, false) => {
                self.rng.gen_bool(miss_chance)
            }
            (RecyclePolicy::Reinforce { hit_chance, .. }, true) => {
                self.rng.gen_bool(hit_chance)
            }
        };
        if is_correct {
            state.mastered.insert(id.clone());
        }
        if requeue {
            state.work_queue.push_back(index);
        }
        state.graded = true;

        tracing::debug!(
            "graded {id}: correct={is_correct} attempts={} requeued={requeue}",
            state.attempt_counts.get(&id).copied().unwrap_or(0)
        );

        let question = &state.run_set[index];
        Ok(GradeResult {
            question_id: id,
            is_correct,
            selected,
            correct_letters: question.correct_letters.clone(),
            correct_options: question.correct_options(),
            rationale: question.rationale.clone(),
            first_attempt,
        })
    }

    /// Move to the next question, or complete the run.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        if self.phase != RunPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }
        let state = self.state.as_mut().ok_or(QuizError::NotInProgress)?;
        if !state.graded {
            return Err(QuizError::AwaitingAnswer);
        }

        if state.work_queue.is_empty() {
            if state.mastered.len() == state.run_set.len() {
                state.current = None;
                self.phase = RunPhase::Completed;
                let summary = RunSummary::build(
                    &state.run_set,
                    &state.attempt_counts,
                    &state.first_try_correct,
                    state.presented_count,
                    self.module.clone(),
                );
                tracing::debug!(
                    "run completed: first try {}% over {} question(s)",
                    summary.first_try_percent,
                    summary.total
                );
                return Ok(Advance::Completed(summary));
            }

            let mut unmastered: Vec<usize> = (0..state.run_set.len())
                .filter(|&i| !state.mastered.contains(&state.run_set[i].id))
                .collect();
            unmastered.shuffle(&mut self.rng);
            tracing::debug!("refilling work queue with {} unmastered", unmastered.len());
            state.work_queue.extend(unmastered);
        }

        let next = state.work_queue.pop_front().ok_or(QuizError::NotInProgress)?;
        state.present(next);
        Ok(Advance::Next(state.run_set[next].clone()))
    }

    /// The question awaiting an answer.
    pub fn current(&self) -> Option<&Question> {
        match self.phase {
            RunPhase::InProgress => self.state.as_ref()?.current_question(),
            _ => None,
        }
    }

    /// The current question with its header counters.
    pub fn view(&self) -> Option<QuestionView> {
        let state = self.state.as_ref()?;
        let question = self.current()?.clone();
        let previous_attempts = state.attempt_counts.get(&question.id).copied().unwrap_or(0);
        Some(QuestionView {
            question,
            progress: state.progress(),
            previous_attempts,
        })
    }

    /// Whether the current presentation has been graded.
    pub fn is_graded(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.graded)
    }

    pub fn progress(&self) -> Option<Progress> {
        self.state.as_ref().map(RunState::progress)
    }

    /// The sampled questions of the session, in sampled order.
    pub fn run_set(&self) -> &[Question] {
        self.state.as_ref().map(|s| s.run_set.as_slice()).unwrap_or(&[])
    }

    pub fn attempts(&self, id: &str) -> u32 {
        self.state
            .as_ref()
            .and_then(|s| s.attempt_counts.get(id).copied())
            .unwrap_or(0)
    }

    pub fn is_mastered(&self, id: &str) -> bool {
        self.state.as_ref().is_some_and(|s| s.mastered.contains(id))
    }

    pub fn is_first_try_correct(&self, id: &str) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.first_try_correct.contains(id))
    }

    /// Questions waiting in the work queue.
    pub fn queued(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.work_queue.len())
    }

    /// Summary of the session so far.
    pub fn summary(&self) -> Option<RunSummary> {
        let state = self.state.as_ref()?;
        Some(RunSummary::build(
            &state.run_set,
            &state.attempt_counts,
            &state.first_try_correct,
            state.presented_count,
            self.module.clone(),
        ))
    }
}

fn validate_length(length: RunLength) -> Result<(), QuizError> {
    match length {
        RunLength::Count(0) => Err(QuizError::InvalidLength("0".into())),
        _ => Ok(()),
    }
}

/// Give every question a distinct id: later repeats become `id-2`, `id-3`, ...
fn dedupe_ids(bank: &mut [Question]) {
    let mut taken: HashSet<String> = HashSet::with_capacity(bank.len());
    for question in bank.iter_mut() {
        if taken.insert(question.id.clone()) {
            continue;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{}-{n}", question.id);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        tracing::warn!("duplicate question id {}, renamed to {renamed}", question.id);
        question.id = renamed.clone();
        taken.insert(renamed);
    }
}

/// Letters picked in free-form answer text (`"a c"`, `"A,C"`, `"ac"`).
pub fn parse_selection(input: &str) -> BTreeSet<char> {
    input
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;
    use serde_json::json;

    fn question(id: &str, stem: &str, correct: &[char]) -> Question {
        Question {
            id: id.into(),
            stem: stem.into(),
            options: ['A', 'B', 'C', 'D']
                .iter()
                .map(|&letter| AnswerOption {
                    letter,
                    text: format!("{stem} {letter}"),
                })
                .collect(),
            correct_letters: correct.iter().copied().collect(),
            is_multi_select: correct.len() > 1,
            rationale: format!("why {stem}"),
        }
    }

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| question(&format!("q{i}"), &format!("Question {i}"), &['A']))
            .collect()
    }

    fn correct_answer(engine: &QuizRunEngine) -> Vec<char> {
        engine
            .current()
            .unwrap()
            .correct_letters
            .iter()
            .copied()
            .collect()
    }

    fn wrong_answer(engine: &QuizRunEngine) -> Vec<char> {
        let q = engine.current().unwrap();
        let wrong = q
            .options
            .iter()
            .map(|o| o.letter)
            .find(|l| !q.correct_letters.contains(l))
            .unwrap();
        vec![wrong]
    }

    #[test]
    fn sampling_draws_unique_questions_from_bank() {
        for seed in 0..20 {
            let mut engine = QuizRunEngine::seeded(seed);
            engine.start_bank(bank(10), RunLength::Count(4)).unwrap();
            let ids: HashSet<&str> = engine.run_set().iter().map(|q| q.id.as_str()).collect();
            assert_eq!(engine.run_set().len(), 4);
            assert_eq!(ids.len(), 4);
            assert!(ids.iter().all(|id| id.starts_with('q')));
        }
    }

    #[test]
    fn full_and_oversized_lengths_take_whole_bank() {
        let mut engine = QuizRunEngine::seeded(1);
        engine.start_bank(bank(5), RunLength::Full).unwrap();
        assert_eq!(engine.run_set().len(), 5);

        engine.start_bank(bank(5), RunLength::Count(50)).unwrap();
        assert_eq!(engine.run_set().len(), 5);
    }

    #[test]
    fn seeded_engines_are_reproducible() {
        let order = |seed| {
            let mut engine = QuizRunEngine::seeded(seed);
            engine.start_bank(bank(8), RunLength::Count(5)).unwrap();
            engine
                .run_set()
                .iter()
                .map(|q| q.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(42), order(42));
    }

    #[test]
    fn start_rejects_bad_input() {
        let mut engine = QuizRunEngine::seeded(0);
        assert_eq!(
            engine.start_bank(vec![], RunLength::Full).unwrap_err(),
            QuizError::EmptyBank
        );
        assert_eq!(
            engine.start_bank(bank(3), RunLength::Count(0)).unwrap_err(),
            QuizError::InvalidLength("0".into())
        );
        assert_eq!(
            engine.start(&json!({"questions": []}), RunLength::Full).unwrap_err(),
            QuizError::EmptyBank
        );
        assert_eq!(engine.phase(), RunPhase::NotStarted);
    }

    #[test]
    fn start_normalizes_raw_json() {
        let raw = json!({"questions": [
            {"stem": "One", "options": ["x", "y"], "correct": ["A"]},
            {"stem": "Two", "options": ["x", "y"], "correct": ["B"]}
        ]});
        let mut engine = QuizRunEngine::seeded(3);
        let first = engine.start(&raw, RunLength::Full).unwrap().clone();
        assert!(first.stem == "One" || first.stem == "Two");
        assert_eq!(engine.phase(), RunPhase::InProgress);
        assert_eq!(engine.progress().unwrap().presented, 1);
    }

    #[test]
    fn all_correct_completes_in_run_set_size_submissions() {
        for seed in 0..10 {
            let mut engine = QuizRunEngine::seeded(seed);
            engine.start_bank(bank(7), RunLength::Count(5)).unwrap();
            let mut submissions = 0;
            let summary = loop {
                let answer = correct_answer(&engine);
                assert!(engine.submit(answer).unwrap().is_correct);
                submissions += 1;
                match engine.advance().unwrap() {
                    Advance::Next(_) => continue,
                    Advance::Completed(summary) => break summary,
                }
            };
            assert_eq!(submissions, 5);
            assert_eq!(summary.first_try_percent, 100);
            assert_eq!(summary.presented, 5);
            assert_eq!(engine.phase(), RunPhase::Completed);
        }
    }

    #[test]
    fn three_correct_answers_score_100_with_clean_review() {
        let mut engine = QuizRunEngine::seeded(6);
        engine.start_bank(bank(3), RunLength::Full).unwrap();
        let summary = loop {
            let answer = correct_answer(&engine);
            engine.submit(answer).unwrap();
            match engine.advance().unwrap() {
                Advance::Next(_) => continue,
                Advance::Completed(summary) => break summary,
            }
        };
        assert_eq!(summary.total, 3);
        assert_eq!(summary.first_try_correct, 3);
        assert_eq!(summary.first_try_percent, 100);
        assert_eq!(summary.review.len(), 3);
        assert!(summary.review.iter().all(|r| r.missed == 0));
    }

    #[test]
    fn missed_question_returns_before_completion() {
        let mut engine = QuizRunEngine::seeded(9);
        engine.start_bank(bank(4), RunLength::Full).unwrap();

        let missed_id = engine.current().unwrap().id.clone();
        let answer = wrong_answer(&engine);
        let grade = engine.submit(answer).unwrap();
        assert!(!grade.is_correct);
        assert!(!engine.is_mastered(&missed_id));

        let mut seen_again = false;
        loop {
            match engine.advance().unwrap() {
                Advance::Next(q) => {
                    if q.id == missed_id {
                        seen_again = true;
                        assert!(!engine.is_mastered(&missed_id));
                    }
                    let answer = correct_answer(&engine);
                    engine.submit(answer).unwrap();
                }
                Advance::Completed(summary) => {
                    let entry = summary.review.iter().find(|r| r.id == missed_id).unwrap();
                    assert_eq!(entry.missed, 1);
                    assert_eq!(summary.review[0].id, missed_id);
                    break;
                }
            }
        }
        assert!(seen_again);
        assert!(engine.is_mastered(&missed_id));
    }

    #[test]
    fn one_miss_in_three_scores_67() {
        let mut engine = QuizRunEngine::seeded(8).with_module("Module 2");
        engine.start_bank(bank(3), RunLength::Full).unwrap();
        let missed_id = engine.current().unwrap().id.clone();
        let answer = wrong_answer(&engine);
        engine.submit(answer).unwrap();

        let summary = loop {
            match engine.advance().unwrap() {
                Advance::Next(_) => {
                    let answer = correct_answer(&engine);
                    engine.submit(answer).unwrap();
                }
                Advance::Completed(summary) => break summary,
            }
        };
        assert_eq!(summary.first_try_correct, 2);
        assert_eq!(summary.first_try_percent, 67);
        assert_eq!(summary.total_attempts, 4);
        assert_eq!(summary.presented, 4);
        assert_eq!(summary.module.as_deref(), Some("Module 2"));
        assert_eq!(summary.review[0].id, missed_id);
        assert_eq!(summary.review[0].missed, 1);
        assert!(summary.review[1..].iter().all(|r| r.missed == 0));
    }

    #[test]
    fn duplicate_ids_in_bank_still_complete() {
        let mut engine = QuizRunEngine::seeded(0);
        let dupes = vec![question("dup", "one", &['A']), question("dup", "two", &['A'])];
        engine.start_bank(dupes, RunLength::Full).unwrap();
        let ids: HashSet<&str> = engine.run_set().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["dup", "dup-2"]));

        engine.submit(['A']).unwrap();
        assert!(matches!(engine.advance().unwrap(), Advance::Next(_)));
        engine.submit(['A']).unwrap();
        let Advance::Completed(summary) = engine.advance().unwrap() else {
            panic!("both questions were answered correctly");
        };
        assert_eq!(summary.total, 2);
        assert_eq!(engine.phase(), RunPhase::Completed);
    }

    #[test]
    fn first_try_status_never_changes() {
        let mut engine = QuizRunEngine::seeded(5);
        engine.start_bank(bank(1), RunLength::Full).unwrap();
        let id = engine.current().unwrap().id.clone();

        let answer = wrong_answer(&engine);
        engine.submit(answer).unwrap();
        assert!(!engine.is_first_try_correct(&id));

        let Advance::Next(again) = engine.advance().unwrap() else {
            panic!("missed question should be presented again");
        };
        assert_eq!(again.id, id);
        let answer = correct_answer(&engine);
        assert!(engine.submit(answer).unwrap().is_correct);
        assert!(!engine.is_first_try_correct(&id));
        assert!(engine.is_mastered(&id));
        assert_eq!(engine.attempts(&id), 2);
    }

    #[test]
    fn multi_select_requires_exact_set() {
        let mut engine = QuizRunEngine::seeded(0);
        engine
            .start_bank(vec![question("m", "Multi", &['A', 'C'])], RunLength::Full)
            .unwrap();

        assert!(!engine.submit(['A']).unwrap().is_correct);
        engine.advance().unwrap();
        assert!(!engine.submit(['A', 'C', 'D']).unwrap().is_correct);
        engine.advance().unwrap();
        let grade = engine.submit(['c', 'a']).unwrap();
        assert!(grade.is_correct);
        assert!(!grade.first_attempt);
        assert_eq!(grade.correct_options.len(), 2);
        assert!(matches!(engine.advance().unwrap(), Advance::Completed(_)));
    }

    #[test]
    fn empty_selection_is_never_graded() {
        let mut engine = QuizRunEngine::seeded(0);
        engine.start_bank(bank(2), RunLength::Full).unwrap();
        assert_eq!(engine.submit([]).unwrap_err(), QuizError::NoSelection);
        assert_eq!(engine.submit([' ']).unwrap_err(), QuizError::NoSelection);
        let id = engine.current().unwrap().id.clone();
        assert_eq!(engine.attempts(&id), 0);
    }

    #[test]
    fn transitions_are_guarded() {
        let mut engine = QuizRunEngine::seeded(0);
        assert_eq!(engine.submit(['A']).unwrap_err(), QuizError::NotInProgress);
        assert_eq!(engine.advance().unwrap_err(), QuizError::NotInProgress);

        engine.start_bank(bank(2), RunLength::Full).unwrap();
        assert_eq!(engine.advance().unwrap_err(), QuizError::AwaitingAnswer);
        engine.submit(['A']).unwrap();
        assert_eq!(engine.submit(['A']).unwrap_err(), QuizError::AlreadyGraded);
        engine.advance().unwrap();
        engine.submit(['A']).unwrap();
        assert!(matches!(engine.advance().unwrap(), Advance::Completed(_)));

        assert_eq!(engine.submit(['A']).unwrap_err(), QuizError::NotInProgress);
        assert_eq!(engine.advance().unwrap_err(), QuizError::NotInProgress);
        assert!(engine.current().is_none());
    }

    #[test]
    fn progress_counts_presentations_and_mastery() {
        let mut engine = QuizRunEngine::seeded(2);
        engine.start_bank(bank(3), RunLength::Full).unwrap();
        let answer = wrong_answer(&engine);
        engine.submit(answer).unwrap();
        engine.advance().unwrap();
        let answer = correct_answer(&engine);
        engine.submit(answer).unwrap();

        let progress = engine.progress().unwrap();
        assert_eq!(progress.presented, 2);
        assert_eq!(progress.unique_seen, 2);
        assert_eq!(progress.mastered, 1);
        assert_eq!(progress.remaining, 2);
        assert_eq!(progress.percent_mastered, 33);
    }

    #[test]
    fn reinforce_policy_still_terminates() {
        let mut engine = QuizRunEngine::seeded(11)
            .with_policy(RecyclePolicy::Reinforce {
                miss_chance: 0.0,
                hit_chance: 0.0,
            })
            .unwrap();
        engine.start_bank(bank(3), RunLength::Full).unwrap();
        let missed_id = engine.current().unwrap().id.clone();
        let answer = wrong_answer(&engine);
        engine.submit(answer).unwrap();
        assert_eq!(engine.queued(), 2);

        let mut presentations = vec![];
        let summary = loop {
            match engine.advance().unwrap() {
                Advance::Next(q) => {
                    presentations.push(q.id.clone());
                    let answer = correct_answer(&engine);
                    engine.submit(answer).unwrap();
                }
                Advance::Completed(summary) => break summary,
            }
        };
        assert!(presentations.contains(&missed_id));
        assert_eq!(summary.first_try_correct, 2);
    }

    #[test]
    fn reinforce_policy_can_repeat_mastered_questions() {
        let policy = RecyclePolicy::Reinforce {
            miss_chance: 1.0,
            hit_chance: 0.5,
        };
        let repeated = (0..64).any(|seed| {
            let mut engine = QuizRunEngine::seeded(seed).with_policy(policy).unwrap();
            engine.start_bank(bank(1), RunLength::Full).unwrap();
            let answer = correct_answer(&engine);
            engine.submit(answer).unwrap();
            engine.queued() == 1 && matches!(engine.advance().unwrap(), Advance::Next(_))
        });
        assert!(repeated);
    }

    #[test]
    fn reinforce_policy_rejects_unusable_chances() {
        let bad = [
            (f64::NAN, 0.05),
            (0.15, f64::NAN),
            (-0.1, 0.05),
            (1.5, 0.05),
            (0.15, 1.0),
            (0.15, f64::INFINITY),
        ];
        for (miss_chance, hit_chance) in bad {
            let policy = RecyclePolicy::Reinforce {
                miss_chance,
                hit_chance,
            };
            assert!(
                matches!(policy.validate(), Err(QuizError::InvalidPolicy(_))),
                "{miss_chance}/{hit_chance} should be rejected"
            );
            assert!(QuizRunEngine::seeded(0).with_policy(policy).is_err());
        }
        assert!(RecyclePolicy::reinforce().validate().is_ok());
        assert!(RecyclePolicy::Always.validate().is_ok());
    }

    #[test]
    fn parse_selection_reads_letters() {
        assert_eq!(parse_selection("a c"), BTreeSet::from(['A', 'C']));
        assert_eq!(parse_selection("A,C"), BTreeSet::from(['A', 'C']));
        assert_eq!(parse_selection("  "), BTreeSet::new());
    }
}
