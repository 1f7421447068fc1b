//! The `studyguide modules` command.

use std::path::PathBuf;

use anyhow::Result;

use studyguide_sources::config::create_source;
use studyguide_sources::list_modules_or_fallback;

use super::resolve_config;

pub async fn execute(
    data_dir: Option<PathBuf>,
    server: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path, data_dir, server)?;
    let source = create_source(&config)?;

    let modules = list_modules_or_fallback(source.as_ref(), &config.fallback_modules).await;
    if modules.is_empty() {
        println!("No modules found. Run `studyguide init` to create a sample bank.");
        return Ok(());
    }

    println!("Source: {}", source.name());
    for m in &modules {
        println!("  {} ({})", m.label, m.file);
    }

    Ok(())
}
