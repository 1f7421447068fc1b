//! In-memory bank source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use studyguide_core::traits::{BankSource, ModuleInfo};

use crate::error::SourceError;

/// A bank source backed by a map of file name to raw bank JSON.
///
/// Lets front ends and the engine be exercised without a disk or network.
pub struct StaticSource {
    /// Map of module file name → raw bank.
    banks: HashMap<String, Value>,
    /// When set, every call fails with this network error.
    failure: Option<String>,
    /// Number of fetches made.
    fetch_count: AtomicU32,
    /// Last module requested.
    last_module: Mutex<Option<String>>,
}

impl StaticSource {
    pub fn new(banks: HashMap<String, Value>) -> Self {
        Self {
            banks,
            failure: None,
            fetch_count: AtomicU32::new(0),
            last_module: Mutex::new(None),
        }
    }

    /// A source with a single module.
    pub fn single(file: &str, bank: Value) -> Self {
        Self::new(HashMap::from([(file.to_string(), bank)]))
    }

    /// A source whose every call fails, as an unreachable server would.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(HashMap::new())
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    pub fn last_module(&self) -> Option<String> {
        self.last_module.lock().ok().and_then(|m| m.clone())
    }
}

#[async_trait]
impl BankSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_modules(&self) -> anyhow::Result<Vec<ModuleInfo>> {
        if let Some(message) = &self.failure {
            return Err(SourceError::Network(message.clone()).into());
        }
        let mut modules: Vec<ModuleInfo> = self.banks.keys().map(ModuleInfo::from_file).collect();
        modules.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(modules)
    }

    async fn fetch_bank(&self, module: &str) -> anyhow::Result<Value> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_module.lock() {
            *last = Some(module.to_string());
        }
        if let Some(message) = &self.failure {
            return Err(SourceError::Network(message.clone()).into());
        }

        let bank = self
            .banks
            .get(module)
            .or_else(|| self.banks.get(&format!("{module}.json")))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(module.to_string()))?;
        Ok(bank)
    }
}
