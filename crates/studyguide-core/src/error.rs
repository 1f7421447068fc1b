//! Quiz error types.
//!
//! Every variant is a local, recoverable condition: the calling layer shows
//! a message and returns the user to the launcher. None of them leave the
//! engine in an invalid state.

use thiserror::Error;

/// Errors raised by the normalizer and the quiz run engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The bank (or the sampled run set) has no usable questions.
    #[error("module appears empty: no usable questions found")]
    EmptyBank,

    /// The requested run length is neither positive nor "full".
    #[error("invalid run length '{0}': expected a positive number or \"full\"")]
    InvalidLength(String),

    /// Recycle probabilities that are out of range or would never finish.
    #[error("invalid recycle policy: {0}")]
    InvalidPolicy(String),

    /// `submit` was called without any selected letters.
    #[error("no answer selected")]
    NoSelection,

    /// The operation needs a session in progress.
    #[error("no quiz in progress")]
    NotInProgress,

    /// `advance` was called before the current question was graded.
    #[error("current question has not been answered yet")]
    AwaitingAnswer,

    /// `submit` was called twice for the same presentation.
    #[error("current question was already graded; advance to continue")]
    AlreadyGraded,
}

impl QuizError {
    /// Returns `true` if the caller should drop back to the pre-quiz state.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            QuizError::EmptyBank | QuizError::InvalidLength(_) | QuizError::InvalidPolicy(_)
        )
    }
}
