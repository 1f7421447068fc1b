//! Run summary types with JSON persistence and markdown rendering.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AnswerOption, Question};

/// The summary produced when a run reaches mastery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Module label, when the caller supplied one.
    #[serde(default)]
    pub module: Option<String>,
    /// When the run completed.
    pub completed_at: DateTime<Utc>,
    /// Number of questions in the run set.
    pub total: usize,
    /// Questions answered correctly on their first submission.
    pub first_try_correct: usize,
    /// `round(100 * first_try_correct / total)`.
    pub first_try_percent: u32,
    /// Submissions across all questions.
    pub total_attempts: u32,
    /// Presentations across the run, repeats included.
    pub presented: usize,
    /// Review entries, most-missed first.
    pub review: Vec<ReviewEntry>,
}

/// Review line for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub id: String,
    pub stem: String,
    pub correct_options: Vec<AnswerOption>,
    #[serde(default)]
    pub rationale: String,
    pub attempts: u32,
    pub missed: u32,
    pub first_try_correct: bool,
}

impl RunSummary {
    /// Build a summary from the run set and its accounting.
    pub fn build(
        run_set: &[Question],
        attempt_counts: &HashMap<String, u32>,
        first_try_correct: &HashSet<String>,
        presented: usize,
        module: Option<String>,
    ) -> Self {
        let mut review: Vec<ReviewEntry> = run_set
            .iter()
            .map(|q| {
                let attempts = attempt_counts.get(&q.id).copied().unwrap_or(0);
                ReviewEntry {
                    id: q.id.clone(),
                    stem: q.stem.clone(),
                    correct_options: q.correct_options(),
                    rationale: q.rationale.clone(),
                    attempts,
                    missed: attempts.saturating_sub(1),
                    first_try_correct: first_try_correct.contains(&q.id),
                }
            })
            .collect();
        sort_review(&mut review);

        let first_try = run_set
            .iter()
            .filter(|q| first_try_correct.contains(&q.id))
            .count();

        Self {
            run_id: Uuid::new_v4(),
            module,
            completed_at: Utc::now(),
            total: run_set.len(),
            first_try_correct: first_try,
            first_try_percent: percent(first_try, run_set.len()),
            total_attempts: review.iter().map(|r| r.attempts).sum(),
            presented,
            review,
        }
    }

    /// Entries missed at least once.
    pub fn missed(&self) -> impl Iterator<Item = &ReviewEntry> {
        self.review.iter().filter(|r| r.missed > 0)
    }

    /// Save the summary as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read summary from {}", path.display()))?;
        let summary: RunSummary =
            serde_json::from_str(&content).context("failed to parse summary JSON")?;
        Ok(summary)
    }

    /// Format the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        if let Some(module) = &self.module {
            md.push_str(&format!("## {module}\n\n"));
        }
        md.push_str(&format!(
            "**First try:** {}% ({}/{})\n\n",
            self.first_try_percent, self.first_try_correct, self.total
        ));

        md.push_str("| Question | Correct answer | Missed | Attempts |\n");
        md.push_str("|----------|----------------|--------|----------|\n");
        for r in &self.review {
            let answer = r
                .correct_options
                .iter()
                .map(|o| format!("{}. {}", o.letter, o.text))
                .collect::<Vec<_>>()
                .join("; ");
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                r.stem.replace('|', "\\|"),
                answer.replace('|', "\\|"),
                r.missed,
                r.attempts
            ));
        }

        md
    }
}

/// Most-missed first, then most attempts, then stem.
pub fn sort_review(review: &mut [ReviewEntry]) {
    review.sort_by(|a, b| {
        b.missed
            .cmp(&a.missed)
            .then_with(|| b.attempts.cmp(&a.attempts))
            .then_with(|| a.stem.cmp(&b.stem))
    });
}

/// Integer percentage, rounded half up.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn question(id: &str, stem: &str) -> Question {
        Question {
            id: id.into(),
            stem: stem.into(),
            options: vec![
                AnswerOption {
                    letter: 'A',
                    text: "yes".into(),
                },
                AnswerOption {
                    letter: 'B',
                    text: "no".into(),
                },
            ],
            correct_letters: BTreeSet::from(['A']),
            is_multi_select: false,
            rationale: "because".into(),
        }
    }

    fn make_summary() -> RunSummary {
        let run_set = vec![question("a", "Alpha"), question("b", "Beta"), question("c", "Gamma")];
        let attempts = HashMap::from([("a".to_string(), 1), ("b".to_string(), 3), ("c".to_string(), 2)]);
        let first = HashSet::from(["a".to_string()]);
        RunSummary::build(&run_set, &attempts, &first, 6, Some("Module 1".into()))
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn review_is_most_missed_first() {
        let summary = make_summary();
        let ids: Vec<&str> = summary.review.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(summary.review[0].missed, 2);
        assert_eq!(summary.total_attempts, 6);
        assert_eq!(summary.first_try_percent, 33);
        assert_eq!(summary.missed().count(), 2);
    }

    #[test]
    fn ties_break_on_stem() {
        let mut review = vec![
            ReviewEntry {
                id: "2".into(),
                stem: "Zebra".into(),
                correct_options: vec![],
                rationale: String::new(),
                attempts: 1,
                missed: 0,
                first_try_correct: true,
            },
            ReviewEntry {
                id: "1".into(),
                stem: "Aardvark".into(),
                correct_options: vec![],
                rationale: String::new(),
                attempts: 1,
                missed: 0,
                first_try_correct: true,
            },
        ];
        sort_review(&mut review);
        assert_eq!(review[0].stem, "Aardvark");
    }

    #[test]
    fn json_roundtrip() {
        let summary = make_summary();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/summary.json");

        summary.save_json(&path).unwrap();
        let loaded = RunSummary::load_json(&path).unwrap();

        assert_eq!(loaded.run_id, summary.run_id);
        assert_eq!(loaded.review, summary.review);
    }

    #[test]
    fn markdown_output() {
        let md = make_summary().to_markdown();
        assert!(md.contains("## Module 1"));
        assert!(md.contains("33% (1/3)"));
        assert!(md.contains("| Beta | A. yes | 2 | 3 |"));
    }
}
