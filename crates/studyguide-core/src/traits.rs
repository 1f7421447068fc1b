//! Core trait definitions for bank sources and quiz renderers.
//!
//! Bank sources are implemented by the `studyguide-sources` crate; renderers
//! live with whatever front end drives the session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{GradeResult, QuestionView};
use crate::report::RunSummary;

// ---------------------------------------------------------------------------
// Bank source trait
// ---------------------------------------------------------------------------

/// Trait for anything that can list modules and fetch raw bank JSON.
#[async_trait]
pub trait BankSource: Send + Sync {
    /// Human-readable source name (e.g. "directory").
    fn name(&self) -> &str;

    /// List the modules this source can serve.
    async fn list_modules(&self) -> anyhow::Result<Vec<ModuleInfo>>;

    /// Fetch one module's raw bank JSON.
    async fn fetch_bank(&self, module: &str) -> anyhow::Result<Value>;
}

/// One selectable module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// File name, as passed to [`BankSource::fetch_bank`].
    pub file: String,
    /// Display label.
    pub label: String,
}

impl ModuleInfo {
    /// Module whose label is derived from the file name.
    pub fn from_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let label = module_label(&file);
        Self { file, label }
    }
}

/// Display label for a bank file: `.json` dropped, underscores as spaces.
pub fn module_label(file: &str) -> String {
    let stem = file.strip_suffix(".json").unwrap_or(file);
    stem.replace('_', " ")
}

// ---------------------------------------------------------------------------
// Renderer trait
// ---------------------------------------------------------------------------

/// Presentation callbacks for a quiz session.
///
/// Implementations only display; they never decide correctness.
pub trait Renderer {
    /// A question is ready for an answer.
    fn show_question(&self, view: &QuestionView);

    /// A submission was graded.
    fn show_grade(&self, grade: &GradeResult);

    /// The run reached mastery.
    fn show_summary(&self, summary: &RunSummary);
}

/// Renderer that displays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn show_question(&self, _view: &QuestionView) {}
    fn show_grade(&self, _grade: &GradeResult) {}
    fn show_summary(&self, _summary: &RunSummary) {}
}
