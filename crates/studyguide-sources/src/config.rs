//! Configuration loading and source factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use studyguide_core::engine::RecyclePolicy;
use studyguide_core::model::{IndexBase, RunLength};
use studyguide_core::normalize::NormalizeOptions;
use studyguide_core::traits::BankSource;

use crate::directory::{DirectorySource, DEFAULT_MODULE_PATTERNS};
use crate::http::HttpSource;
use crate::DEFAULT_FALLBACK_MODULES;

/// Top-level studyguide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyGuideConfig {
    /// Directory holding the bank files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Study-tool server to fetch banks from instead of `data_dir`.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Run length used when none is given.
    #[serde(
        default,
        serialize_with = "serialize_length",
        deserialize_with = "deserialize_length"
    )]
    pub default_length: RunLength,
    /// File-name patterns of bank files.
    #[serde(default = "default_module_patterns")]
    pub module_patterns: Vec<String>,
    /// Modules offered when listing fails.
    #[serde(default = "default_fallback_modules")]
    pub fallback_modules: Vec<String>,
    /// Convention for numeric correct-answer indices.
    #[serde(default)]
    pub index_base: IndexBase,
    /// What happens to graded questions.
    #[serde(default, deserialize_with = "deserialize_recycle")]
    pub recycle: RecyclePolicy,
    /// Where summaries are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./banks")
}
fn default_module_patterns() -> Vec<String> {
    DEFAULT_MODULE_PATTERNS.iter().map(|p| p.to_string()).collect()
}
fn default_fallback_modules() -> Vec<String> {
    DEFAULT_FALLBACK_MODULES.iter().map(|m| m.to_string()).collect()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./studyguide-results")
}

impl Default for StudyGuideConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server_url: None,
            default_length: RunLength::default(),
            module_patterns: default_module_patterns(),
            fallback_modules: default_fallback_modules(),
            index_base: IndexBase::default(),
            recycle: RecyclePolicy::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl StudyGuideConfig {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            index_base: self.index_base,
        }
    }
}

/// Lengths are written as `25` or `"full"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(i64),
    Text(String),
}

fn deserialize_length<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RunLength, D::Error> {
    let text = match LengthRepr::deserialize(deserializer)? {
        LengthRepr::Number(n) => n.to_string(),
        LengthRepr::Text(s) => s,
    };
    text.parse().map_err(serde::de::Error::custom)
}

fn deserialize_recycle<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<RecyclePolicy, D::Error> {
    let policy = RecyclePolicy::deserialize(deserializer)?;
    policy.validate().map_err(serde::de::Error::custom)?;
    Ok(policy)
}

fn serialize_length<S: Serializer>(length: &RunLength, serializer: S) -> Result<S::Ok, S::Error> {
    match length {
        RunLength::Full => serializer.serialize_str("full"),
        RunLength::Count(n) => serializer.serialize_u64(*n as u64),
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        // Substituted values are not expanded again.
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Apply `STUDYGUIDE_*` overrides, then expand `${VAR}` references.
fn apply_env(config: &mut StudyGuideConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(dir) = var("STUDYGUIDE_DATA_DIR").filter(|d| !d.is_empty()) {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(url) = var("STUDYGUIDE_SERVER_URL").filter(|u| !u.is_empty()) {
        config.server_url = Some(url);
    }

    config.data_dir = PathBuf::from(resolve_env_vars(&config.data_dir.to_string_lossy()));
    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    config.server_url = config
        .server_url
        .as_deref()
        .map(resolve_env_vars)
        .filter(|u| !u.trim().is_empty());
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyguide.toml` in the current directory
/// 2. `~/.config/studyguide/config.toml`
///
/// Environment variable overrides: `STUDYGUIDE_DATA_DIR`, `STUDYGUIDE_SERVER_URL`.
pub fn load_config() -> Result<StudyGuideConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyGuideConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studyguide.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => StudyGuideConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<StudyGuideConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<StudyGuideConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyguide"))
}

/// Create the bank source the configuration points at.
///
/// A server URL takes precedence over the data directory.
pub fn create_source(config: &StudyGuideConfig) -> Result<Box<dyn BankSource>> {
    match &config.server_url {
        Some(url) => Ok(Box::new(HttpSource::new(url)?)),
        None => Ok(Box::new(
            DirectorySource::new(&config.data_dir).with_patterns(config.module_patterns.clone()),
        )),
    }
}
