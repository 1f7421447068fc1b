//! Local data-directory bank source.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use studyguide_core::traits::{BankSource, ModuleInfo};

use crate::error::SourceError;

/// File-name patterns recognised as question banks.
pub const DEFAULT_MODULE_PATTERNS: &[&str] =
    &["Module_*.json", "Learning_*.json", "Pharm_*.json", "*_Quiz_*.json"];

/// Serves banks from the top level of a data directory.
pub struct DirectorySource {
    dir: PathBuf,
    patterns: Vec<String>,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            patterns: DEFAULT_MODULE_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Replace the module patterns. An empty list keeps the defaults.
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_module(&self, file: &str) -> bool {
        self.patterns.iter().any(|p| wildcard_match(p, file))
    }

    async fn module_files(&self) -> Result<BTreeSet<String>, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.dir.display().to_string(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut files = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.is_module(name) {
                    files.insert(name.to_string());
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl BankSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn list_modules(&self) -> anyhow::Result<Vec<ModuleInfo>> {
        let files = self.module_files().await?;
        tracing::debug!("found {} module file(s)", files.len());
        Ok(files.into_iter().map(ModuleInfo::from_file).collect())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn fetch_bank(&self, module: &str) -> anyhow::Result<Value> {
        let file = safe_file_name(module).ok_or_else(|| SourceError::NotFound(module.to_string()))?;
        if !self.module_files().await?.contains(&file) {
            return Err(SourceError::NotFound(module.to_string()).into());
        }

        let path = self.dir.join(&file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let bank = serde_json::from_str(&content).map_err(|e| SourceError::InvalidJson {
            name: file.clone(),
            message: e.to_string(),
        })?;
        Ok(bank)
    }
}

/// Basename of a requested module with `.json` appended when missing.
///
/// Anything that tries to leave the data directory yields `None`.
pub fn safe_file_name(module: &str) -> Option<String> {
    let name = module.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return None;
    }
    if name.ends_with(".json") {
        Some(name.to_string())
    } else {
        Some(format!("{name}.json"))
    }
}

/// Match `name` against a pattern where `*` stands for any run of characters.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !name.starts_with(first) || name.len() < first.len() + last.len() || !name.ends_with(last) {
        return false;
    }

    let mut rest = &name[first.len()..name.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn wildcard_patterns() {
        assert!(wildcard_match("Module_*.json", "Module_1.json"));
        assert!(wildcard_match("*_Quiz_*.json", "Cardiac_Quiz_2.json"));
        assert!(!wildcard_match("*_Quiz_*.json", "Quiz_2.json"));
        assert!(!wildcard_match("Module_*.json", "Module_1.txt"));
        assert!(wildcard_match("exact.json", "exact.json"));
        assert!(!wildcard_match("Pharm_*.json", "Pharm.json"));
    }

    #[test]
    fn safe_names_stay_in_directory() {
        assert_eq!(safe_file_name("Module_1").as_deref(), Some("Module_1.json"));
        assert_eq!(safe_file_name("Module_1.json").as_deref(), Some("Module_1.json"));
        assert_eq!(safe_file_name("../secret.json"), None);
        assert_eq!(safe_file_name("sub/Module_1.json"), None);
        assert_eq!(safe_file_name(".hidden"), None);
        assert_eq!(safe_file_name("  "), None);
    }

    #[tokio::test]
    async fn lists_matching_files_sorted_with_labels() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Module_2.json", "[]");
        write(dir.path(), "Module_1.json", "[]");
        write(dir.path(), "Cardiac_Quiz_3.json", "[]");
        write(dir.path(), "notes.json", "[]");
        write(dir.path(), "Module_1.txt", "");
        std::fs::create_dir(dir.path().join("Module_dir.json")).unwrap();

        let source = DirectorySource::new(dir.path());
        let modules = source.list_modules().await.unwrap();
        let files: Vec<&str> = modules.iter().map(|m| m.file.as_str()).collect();
        assert_eq!(files, vec!["Cardiac_Quiz_3.json", "Module_1.json", "Module_2.json"]);
        assert_eq!(modules[1].label, "Module 1");
    }

    #[tokio::test]
    async fn custom_patterns_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Module_1.json", "[]");
        write(dir.path(), "week1.json", "[]");

        let source = DirectorySource::new(dir.path()).with_patterns(vec!["week*.json".into()]);
        let modules = source.list_modules().await.unwrap();
        assert_eq!(modules, vec![ModuleInfo::from_file("week1.json")]);
    }

    #[tokio::test]
    async fn fetches_listed_bank_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Module_1.json", r#"{"questions": [{"stem": "x"}]}"#);
        write(dir.path(), "secret.json", "{}");

        let source = DirectorySource::new(dir.path());
        let bank = source.fetch_bank("Module_1").await.unwrap();
        assert_eq!(bank["questions"][0]["stem"], "x");

        let err = source.fetch_bank("secret.json").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::NotFound(_))
        ));
        assert!(source.fetch_bank("../Module_1.json").await.is_err());
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Module_1.json", "{ not json");

        let source = DirectorySource::new(dir.path());
        let err = source.fetch_bank("Module_1.json").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::InvalidJson { .. })
        ));
    }

    #[tokio::test]
    async fn missing_directory_is_io_error() {
        let source = DirectorySource::new("/nonexistent/studyguide/banks");
        let err = source.list_modules().await.unwrap_err();
        assert!(err.to_string().contains("I/O error"));
    }
}
