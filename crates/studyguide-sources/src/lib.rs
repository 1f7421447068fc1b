//! studyguide-sources — Question-bank sources.
//!
//! Implements the `BankSource` trait for a local data directory, a static
//! HTTP server, and an in-memory map, plus the `studyguide.toml` config.

pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod mock;

use studyguide_core::traits::{BankSource, ModuleInfo};

pub use config::{create_source, load_config, load_config_from, StudyGuideConfig};
pub use directory::DirectorySource;
pub use error::SourceError;
pub use http::HttpSource;
pub use mock::StaticSource;

/// Modules shown when a source cannot list its own.
pub const DEFAULT_FALLBACK_MODULES: &[&str] = &[
    "Module_1.json",
    "Module_2.json",
    "Module_3.json",
    "Module_4.json",
    "Pharm_Quiz_HESI.json",
    "Learning_Questions_Module_1_2.json",
    "Learning_Questions_Module_3_4_.json",
    "Pharmacology_1.json",
    "Pharmacology_2.json",
    "Pharmacology_3.json",
];

/// List modules, or fall back to `fallback` when listing fails or is empty.
pub async fn list_modules_or_fallback(
    source: &dyn BankSource,
    fallback: &[String],
) -> Vec<ModuleInfo> {
    match source.list_modules().await {
        Ok(modules) if !modules.is_empty() => modules,
        Ok(_) => {
            tracing::warn!("{} listed no modules; using fallback list", source.name());
            fallback.iter().map(ModuleInfo::from_file).collect()
        }
        Err(e) => {
            tracing::warn!(
                "failed to list modules from {}: {e:#}; using fallback list",
                source.name()
            );
            fallback.iter().map(ModuleInfo::from_file).collect()
        }
    }
}
