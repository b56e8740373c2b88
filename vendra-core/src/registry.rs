use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::provider::{HealthReport, Provider};

/// Lookup from provider name to adapter instance.
///
/// Built once at process start from the configured adapters and passed
/// explicitly (Arc) to the importer, reconciler and dispatcher, never
/// resolved through global state.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        tracing::info!("Registered provider adapter: {}", name);
        self.providers.insert(name, provider);
    }

    /// Resolve an adapter by name. Unknown names come back as
    /// `Unconfigured`, which importer callers turn into the fallback path.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::Unconfigured(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Probe every registered adapter.
    pub async fn health_snapshot(&self) -> HashMap<String, HealthReport> {
        let mut snapshot = HashMap::new();
        for (name, provider) in &self.providers {
            snapshot.insert(name.clone(), provider.check_health().await);
        }
        snapshot
    }
}
