//! Quiz session driver.
//!
//! Pairs a [`QuizRunEngine`] with a [`Renderer`] so front ends only forward
//! user input; every step emits exactly one renderer callback.

use rand::Rng;
use serde_json::Value;

use crate::engine::{Advance, GradeResult, QuizRunEngine};
use crate::error::QuizError;
use crate::model::{Question, RunLength};
use crate::report::RunSummary;
use crate::traits::Renderer;

/// A quiz engine wired to a renderer.
pub struct QuizSession<R: Rng, V: Renderer> {
    engine: QuizRunEngine<R>,
    renderer: V,
}

impl<R: Rng, V: Renderer> QuizSession<R, V> {
    pub fn new(engine: QuizRunEngine<R>, renderer: V) -> Self {
        Self { engine, renderer }
    }

    /// Start on raw bank JSON and show the first question.
    pub fn start(&mut self, raw: &Value, length: RunLength) -> Result<(), QuizError> {
        self.engine.start(raw, length)?;
        self.show_current();
        Ok(())
    }

    /// Start on a normalized bank and show the first question.
    pub fn start_bank(&mut self, bank: Vec<Question>, length: RunLength) -> Result<(), QuizError> {
        self.engine.start_bank(bank, length)?;
        self.show_current();
        Ok(())
    }

    /// Grade the current question and show the result.
    pub fn answer<I>(&mut self, selected: I) -> Result<GradeResult, QuizError>
    where
        I: IntoIterator<Item = char>,
    {
        let grade = self.engine.submit(selected)?;
        self.renderer.show_grade(&grade);
        Ok(grade)
    }

    /// Advance; shows either the next question or the summary.
    ///
    /// Returns the summary once the run is complete.
    pub fn next(&mut self) -> Result<Option<RunSummary>, QuizError> {
        match self.engine.advance()? {
            Advance::Next(_) => {
                self.show_current();
                Ok(None)
            }
            Advance::Completed(summary) => {
                self.renderer.show_summary(&summary);
                Ok(Some(summary))
            }
        }
    }

    pub fn engine(&self) -> &QuizRunEngine<R> {
        &self.engine
    }

    pub fn renderer(&self) -> &V {
        &self.renderer
    }

    pub fn into_parts(self) -> (QuizRunEngine<R>, V) {
        (self.engine, self.renderer)
    }

    fn show_current(&self) {
        if let Some(view) = self.engine.view() {
            self.renderer.show_question(&view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::QuestionView;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Renderer for Recorder {
        fn show_question(&self, view: &QuestionView) {
            self.events.lock().unwrap().push(format!(
                "question {} #{}",
                view.question.stem, view.progress.presented
            ));
        }

        fn show_grade(&self, grade: &GradeResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("grade {}", grade.is_correct));
        }

        fn show_summary(&self, summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("summary {}%", summary.first_try_percent));
        }
    }

    fn single_question() -> Value {
        json!([{"question": "Pick B", "options": ["a", "b", "c"], "answer": "B"}])
    }

    #[test]
    fn emits_one_callback_per_step() {
        let mut session = QuizSession::new(QuizRunEngine::seeded(1), Recorder::default());
        session.start(&single_question(), RunLength::Count(10)).unwrap();
        session.answer(['A']).unwrap();
        assert!(session.next().unwrap().is_none());
        session.answer(['b']).unwrap();
        let summary = session.next().unwrap().unwrap();
        assert_eq!(summary.review[0].missed, 1);

        assert_eq!(
            session.renderer().events(),
            vec![
                "question Pick B #1",
                "grade false",
                "question Pick B #2",
                "grade true",
                "summary 0%",
            ]
        );
    }

    #[test]
    fn rejected_input_emits_nothing() {
        let mut session = QuizSession::new(QuizRunEngine::seeded(1), Recorder::default());
        assert!(session.start(&json!({"questions": []}), RunLength::Full).is_err());
        session.start(&single_question(), RunLength::Full).unwrap();
        assert_eq!(session.answer([]).unwrap_err(), QuizError::NoSelection);
        assert_eq!(session.next().unwrap_err(), QuizError::AwaitingAnswer);
        assert_eq!(session.renderer().events().len(), 1);
    }
}
