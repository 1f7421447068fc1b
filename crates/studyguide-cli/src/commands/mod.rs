pub mod init;
pub mod modules;
pub mod quiz;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use studyguide_sources::config::{load_config_from, StudyGuideConfig};

/// Load config and apply the source flags shared by `quiz` and `modules`.
pub fn resolve_config(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    server: Option<String>,
) -> Result<StudyGuideConfig> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
        config.server_url = None;
    }
    if let Some(url) = server {
        config.server_url = Some(url);
    }
    Ok(config)
}
