//! studyguide-core — Question-bank normalization and the until-mastery quiz engine.
//!
//! This crate defines the canonical question model, the normalizer that
//! turns loosely-structured bank JSON into it, and the run engine that
//! drives a quiz session to mastery.

pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod report;
pub mod session;
pub mod traits;

pub use engine::{Advance, GradeResult, Progress, QuizRunEngine, RecyclePolicy, RunPhase};
pub use error::QuizError;
pub use model::{AnswerOption, IndexBase, Question, RunLength};
pub use normalize::{normalize, normalize_with, NormalizeOptions, NormalizedBank};
pub use report::RunSummary;
